//! Common types shared between ocm-console-api and ocm-console-cli

pub mod rbac;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Managed cluster lifecycle status as shown by the console
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    /// Registered on the hub, agent not yet running on the cluster
    PendingImport,
    /// Import was attempted and failed
    ImportFailed,
    Ready,
    Offline,
    Detaching,
    #[default]
    Unknown,
}

impl ClusterStatus {
    /// Whether the console should offer the manual import command
    pub fn awaits_import(&self) -> bool {
        matches!(self, Self::PendingImport | Self::ImportFailed)
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingImport => write!(f, "pendingimport"),
            Self::ImportFailed => write!(f, "importfailed"),
            Self::Ready => write!(f, "ready"),
            Self::Offline => write!(f, "offline"),
            Self::Detaching => write!(f, "detaching"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Command-line tool the generated import command targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CliTool {
    #[default]
    Kubectl,
    Oc,
}

impl CliTool {
    pub fn from_oc_flag(oc: bool) -> Self {
        if oc {
            Self::Oc
        } else {
            Self::Kubectl
        }
    }

    pub fn binary(&self) -> &'static str {
        match self {
            Self::Kubectl => "kubectl",
            Self::Oc => "oc",
        }
    }
}

impl std::fmt::Display for CliTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Outcome of an import command request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportCommandStatus {
    /// Command generated from the import secret
    Ready,
    /// Cluster is configured to auto-import; no command is shown
    AutoImport,
    /// Cluster is provisioned by hive or is not waiting for import
    NotApplicable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCommandResponse {
    pub cluster: String,
    pub tool: CliTool,
    pub status: ImportCommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Set while the cluster still waits for its first import
    #[serde(default)]
    pub pending_import: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Row of the bare metal assets table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BareMetalAssetRow {
    pub name: String,
    pub namespace: String,
    pub uid: Option<String>,
    /// Value of `metal3.io/cluster-deployment-name`, or `-`
    pub cluster: String,
    /// Value of `metal3.io/role`, or `-`
    pub role: String,
    pub status_key: String,
    pub status: String,
}

/// Namespaced reference to a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for ResourceRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(ns, name))
            }
            _ => Err(Error::Validation(format!(
                "expected <namespace>/<name>, got '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub resources: Vec<ResourceRef>,
}

/// Per-resource result of a batch delete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub resource: ResourceRef,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Hive configuration file returned for download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationFile {
    pub file_name: String,
    pub content: String,
}

/// One label row of the cluster selector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelEntry {
    pub id: usize,
    pub name: String,
    pub value: String,
    pub valid: bool,
}

/// A cluster set chosen for placement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterSetEntry {
    pub name: String,
    /// A ManagedClusterSetBinding already exists in the target namespace
    pub has_binding: bool,
}

/// Validation finding reported against a selector control
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectorException {
    pub row: usize,
    pub text: String,
    pub control_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorEvaluateRequest {
    /// Whether the user switched the selector on
    #[serde(default)]
    pub mode: bool,
    /// Label rows of an existing placement rule; makes the selector read-only
    #[serde(default)]
    pub existing: Vec<LabelEntry>,
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub cluster_sets: Vec<String>,
    /// Application template; its first namespace scopes the binding lookup
    #[serde(default)]
    pub template_yaml: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorEvaluateResponse {
    pub exceptions: Vec<SelectorException>,
    pub match_labels: BTreeMap<String, String>,
    pub cluster_sets: Vec<ClusterSetEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Shared error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
