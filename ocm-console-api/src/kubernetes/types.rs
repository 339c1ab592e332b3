//! Kubernetes types for the console API
//!
//! Simplified views of the cluster-management custom resources. The resources
//! are read through `DynamicObject` and converted into these types.

use chrono::{DateTime, Utc};
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use ocm_console_common::ClusterStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{K8sError, K8sResult};

pub const MANAGED_CLUSTER_GROUP: &str = "cluster.open-cluster-management.io";
pub const INVENTORY_GROUP: &str = "inventory.open-cluster-management.io";
pub const HIVE_GROUP: &str = "hive.openshift.io";

/// ApiResource for `ManagedCluster` (cluster-scoped)
pub fn managed_cluster_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        MANAGED_CLUSTER_GROUP,
        "v1",
        "ManagedCluster",
    ))
}

/// ApiResource for `ManagedClusterSetBinding` (namespaced)
pub fn cluster_set_binding_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        MANAGED_CLUSTER_GROUP,
        "v1beta2",
        "ManagedClusterSetBinding",
    ))
}

/// ApiResource for hive `ClusterDeployment` (namespaced)
pub fn cluster_deployment_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(HIVE_GROUP, "v1", "ClusterDeployment"))
}

/// ApiResource for `BareMetalAsset` (namespaced)
pub fn bare_metal_asset_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        INVENTORY_GROUP,
        "v1alpha1",
        "BareMetalAsset",
    ))
}

/// Convert a dynamic object into a typed view
pub fn from_dynamic<T: DeserializeOwned>(obj: DynamicObject) -> K8sResult<T> {
    let name = obj.metadata.name.clone().unwrap_or_default();
    let value = serde_json::to_value(obj)
        .map_err(|e| K8sError::Malformed(format!("{}: {}", name, e)))?;
    serde_json::from_value(value).map_err(|e| K8sError::Malformed(format!("{}: {}", name, e)))
}

/// Status condition as found on the cluster-management resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCondition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl ResourceCondition {
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }

    pub fn is_false(&self) -> bool {
        self.status == "False"
    }
}

/// Names of the hive secrets holding install-config and admin kubeconfig
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveSecrets {
    pub install_config: Option<String>,
    pub kubeconfig: Option<String>,
}

/// Console view of a managed cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedClusterInfo {
    pub name: String,
    /// Hub namespace holding the cluster's resources; same as the name
    pub namespace: String,
    pub status: ClusterStatus,
    /// Provisioned by hive (has a ClusterDeployment)
    pub is_hive: bool,
    pub hive_secrets: Option<HiveSecrets>,
}

impl ManagedClusterInfo {
    pub fn new(name: &str, status: ClusterStatus) -> Self {
        Self {
            name: name.to_string(),
            namespace: name.to_string(),
            status,
            is_hive: false,
            hive_secrets: None,
        }
    }
}

/// `ManagedClusterSetBinding` reduced to the fields the selector needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSetBinding {
    pub name: String,
    pub namespace: String,
}
