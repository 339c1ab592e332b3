//! Managed cluster lookups
//!
//! ManagedCluster, hive ClusterDeployment and ManagedClusterSetBinding reads.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams};
use ocm_console_common::ClusterStatus;
use serde_json::Value;

use super::client::K8sClient;
use super::error::{K8sError, K8sResult};
use super::types::{
    cluster_deployment_resource, cluster_set_binding_resource, managed_cluster_resource,
    ClusterSetBinding, HiveSecrets, ManagedClusterInfo, ResourceCondition,
};

const CONDITION_AVAILABLE: &str = "ManagedClusterConditionAvailable";
const CONDITION_JOINED: &str = "ManagedClusterJoined";
const CONDITION_IMPORT_SUCCEEDED: &str = "ManagedClusterImportSucceeded";

/// Read access to the managed clusters registered on the hub
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    async fn managed_cluster(&self, name: &str) -> K8sResult<ManagedClusterInfo>;

    async fn cluster_set_bindings(&self, namespace: &str) -> K8sResult<Vec<ClusterSetBinding>>;
}

#[async_trait]
impl ClusterDirectory for K8sClient {
    async fn managed_cluster(&self, name: &str) -> K8sResult<ManagedClusterInfo> {
        let ar = managed_cluster_resource();
        let clusters: Api<DynamicObject> = Api::all_with(self.inner().clone(), &ar);
        let cluster = clusters
            .get(name)
            .await
            .map_err(|e| K8sError::from_lookup(e, "ManagedCluster", "", name))?;

        let deleting = cluster.metadata.deletion_timestamp.is_some();
        let conditions = conditions_of(&cluster.data);
        let mut info = ManagedClusterInfo::new(name, derive_cluster_status(&conditions, deleting));

        let ar = cluster_deployment_resource();
        let deployments: Api<DynamicObject> =
            Api::namespaced_with(self.inner().clone(), name, &ar);
        // get_opt also yields None when the hive CRD is not installed
        if let Some(deployment) = deployments.get_opt(name).await? {
            info.is_hive = true;
            info.hive_secrets = Some(hive_secrets(&deployment.data));
        }

        tracing::debug!(cluster = %name, status = %info.status, is_hive = info.is_hive, "Resolved managed cluster");

        Ok(info)
    }

    async fn cluster_set_bindings(&self, namespace: &str) -> K8sResult<Vec<ClusterSetBinding>> {
        let ar = cluster_set_binding_resource();
        let bindings: Api<DynamicObject> =
            Api::namespaced_with(self.inner().clone(), namespace, &ar);
        let list = bindings.list(&ListParams::default()).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|b| {
                Some(ClusterSetBinding {
                    name: b.metadata.name?,
                    namespace: b.metadata.namespace.unwrap_or_else(|| namespace.to_string()),
                })
            })
            .collect())
    }
}

fn conditions_of(data: &Value) -> Vec<ResourceCondition> {
    data.pointer("/status/conditions")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

fn hive_secrets(data: &Value) -> HiveSecrets {
    let name_at = |path: &str| {
        data.pointer(path)
            .and_then(Value::as_str)
            .map(String::from)
    };

    HiveSecrets {
        install_config: name_at("/spec/provisioning/installConfigSecretRef/name"),
        kubeconfig: name_at("/spec/clusterMetadata/adminKubeconfigSecretRef/name"),
    }
}

/// Console status of a managed cluster from its conditions
pub fn derive_cluster_status(conditions: &[ResourceCondition], deleting: bool) -> ClusterStatus {
    if deleting {
        return ClusterStatus::Detaching;
    }

    let find = |kind: &str| conditions.iter().find(|c| c.type_ == kind);

    if find(CONDITION_IMPORT_SUCCEEDED).is_some_and(|c| c.is_false() && c.reason.contains("Failed"))
    {
        return ClusterStatus::ImportFailed;
    }

    if !find(CONDITION_JOINED).is_some_and(ResourceCondition::is_true) {
        return ClusterStatus::PendingImport;
    }

    match find(CONDITION_AVAILABLE) {
        Some(c) if c.is_true() => ClusterStatus::Ready,
        Some(c) if c.is_false() => ClusterStatus::Offline,
        _ => ClusterStatus::Unknown,
    }
}
