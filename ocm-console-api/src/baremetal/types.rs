//! BareMetalAsset resource view and status derivation

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use ocm_console_common::BareMetalAssetRow;
use serde::{Deserialize, Serialize};

use crate::kubernetes::types::ResourceCondition;

pub const CLUSTER_DEPLOYMENT_LABEL: &str = "metal3.io/cluster-deployment-name";
pub const ROLE_LABEL: &str = "metal3.io/role";

pub const CONDITION_CLUSTER_DEPLOYMENT_FOUND: &str = "ClusterDeploymentFound";
pub const REASON_NONE_SPECIFIED: &str = "NoneSpecified";

const STATUS_KEY_PREFIX: &str = "bareMetalAsset.statusMessage";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BareMetalAsset {
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BareMetalAssetStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BareMetalAssetStatus {
    #[serde(default)]
    pub conditions: Vec<ResourceCondition>,
}

impl BareMetalAsset {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Label value, or `-` when unset or empty
    pub fn label_or_dash(&self, key: &str) -> String {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn to_row(&self) -> BareMetalAssetRow {
        let (status_key, status) = status_message(self)
            .map(|s| (s.key, s.text))
            .unwrap_or_default();

        BareMetalAssetRow {
            name: self.name().to_string(),
            namespace: self.namespace().to_string(),
            uid: self.metadata.uid.clone(),
            cluster: self.label_or_dash(CLUSTER_DEPLOYMENT_LABEL),
            role: self.label_or_dash(ROLE_LABEL),
            status_key,
            status,
        }
    }
}

/// The most recent condition. Conditions with the same transition time
/// resolve to the one listed last; a missing time sorts first.
pub fn current_condition(conditions: &[ResourceCondition]) -> Option<&ResourceCondition> {
    conditions.iter().max_by_key(|c| c.last_transition_time)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Message catalogue key
    pub key: String,
    /// Condition message, or the reason when the condition carries none
    pub text: String,
}

/// Status message for the asset's current condition; `None` without status
pub fn status_message(asset: &BareMetalAsset) -> Option<StatusMessage> {
    let condition = current_condition(&asset.status.as_ref()?.conditions)?;

    let key = if condition.reason == REASON_NONE_SPECIFIED
        && condition.type_ == CONDITION_CLUSTER_DEPLOYMENT_FOUND
    {
        format!("{}.clusterDeploymentNameNotFound", STATUS_KEY_PREFIX)
    } else {
        format!("{}.{}", STATUS_KEY_PREFIX, condition.reason)
    };

    let text = condition
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| condition.reason.clone());

    Some(StatusMessage { key, text })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;

    pub fn condition(type_: &str, reason: &str, at: &str) -> ResourceCondition {
        ResourceCondition {
            type_: type_.to_string(),
            status: "True".to_string(),
            reason: reason.to_string(),
            message: None,
            last_transition_time: Some(at.parse::<DateTime<Utc>>().unwrap()),
        }
    }

    pub fn asset(namespace: &str, name: &str) -> BareMetalAsset {
        BareMetalAsset {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                uid: Some(format!("uid-{}", name)),
                labels: Some(BTreeMap::new()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
