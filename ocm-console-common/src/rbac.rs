//! Permission-check types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes of a single access review (one RBAC sub-check)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceAttributes {
    #[serde(default)]
    pub group: String,
    pub resource: String,
    pub verb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subresource: Option<String>,
}

impl ResourceAttributes {
    pub fn new(group: &str, resource: &str, verb: &str) -> Self {
        Self {
            group: group.to_string(),
            resource: resource.to_string(),
            verb: verb.to_string(),
            ..Default::default()
        }
    }

    pub fn in_namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty()).map(String::from);
        self
    }

    pub fn named(mut self, name: Option<&str>) -> Self {
        self.name = name.filter(|n| !n.is_empty()).map(String::from);
        self
    }
}

/// Console actions gated by RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RbacAction {
    #[serde(rename = "bma.edit")]
    BmaEdit,
    #[serde(rename = "bma.delete")]
    BmaDelete,
    #[serde(rename = "bma.create")]
    BmaCreate,
    #[serde(rename = "cluster.create")]
    ClusterCreate,
    #[serde(rename = "secret.get")]
    SecretGet,
}

impl RbacAction {
    /// Actions offered in the bare metal asset row dropdown
    pub const TABLE_ACTIONS: [RbacAction; 2] = [RbacAction::BmaDelete, RbacAction::BmaEdit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BmaEdit => "bma.edit",
            Self::BmaDelete => "bma.delete",
            Self::BmaCreate => "bma.create",
            Self::ClusterCreate => "cluster.create",
            Self::SecretGet => "secret.get",
        }
    }
}

impl std::fmt::Display for RbacAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RbacAction {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "bma.edit" => Ok(Self::BmaEdit),
            "bma.delete" => Ok(Self::BmaDelete),
            "bma.create" => Ok(Self::BmaCreate),
            "cluster.create" => Ok(Self::ClusterCreate),
            "secret.get" => Ok(Self::SecretGet),
            other => Err(crate::Error::Validation(format!("unknown action '{}'", other))),
        }
    }
}

/// Per-action permission flags; every action starts disabled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableActionAccess(pub BTreeMap<RbacAction, bool>);

impl TableActionAccess {
    pub fn disabled(actions: &[RbacAction]) -> Self {
        Self(actions.iter().map(|a| (*a, false)).collect())
    }

    pub fn is_allowed(&self, action: RbacAction) -> bool {
        self.0.get(&action).copied().unwrap_or(false)
    }

    pub fn set(&mut self, action: RbacAction, allowed: bool) {
        self.0.insert(action, allowed);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessReviewRequest {
    pub checks: Vec<ResourceAttributes>,
}

/// Result of one sub-check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessReviewResult {
    pub attributes: ResourceAttributes,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessReviewResponse {
    pub results: Vec<AccessReviewResult>,
    /// True only when every sub-check was allowed
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationPermission {
    pub creation_restricted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip_names() {
        for action in [
            RbacAction::BmaEdit,
            RbacAction::BmaDelete,
            RbacAction::BmaCreate,
            RbacAction::ClusterCreate,
            RbacAction::SecretGet,
        ] {
            assert_eq!(action.as_str().parse::<RbacAction>().unwrap(), action);
        }
        assert!("bma.rename".parse::<RbacAction>().is_err());
    }

    #[test]
    fn test_table_access_defaults_to_disabled() {
        let mut access = TableActionAccess::disabled(&RbacAction::TABLE_ACTIONS);
        assert!(!access.is_allowed(RbacAction::BmaEdit));
        assert!(!access.is_allowed(RbacAction::BmaDelete));
        assert!(!access.is_allowed(RbacAction::ClusterCreate));

        access.set(RbacAction::BmaEdit, true);
        assert!(access.is_allowed(RbacAction::BmaEdit));

        let json = serde_json::to_value(&access).unwrap();
        assert_eq!(json["bma.edit"], true);
        assert_eq!(json["bma.delete"], false);
    }

    #[test]
    fn test_attributes_skip_empty_scope() {
        let attrs = ResourceAttributes::new("", "secrets", "get")
            .in_namespace(Some(""))
            .named(None);
        assert!(attrs.namespace.is_none());
        assert!(attrs.name.is_none());
    }
}
