//! Configuration download for hive-provisioned clusters
//!
//! Hive keeps the install-config and the admin kubeconfig of the clusters it
//! provisions in secrets referenced by the ClusterDeployment.

use ocm_console_common::ConfigurationFile;
use std::sync::Arc;

use crate::kubernetes::secrets::unpack_secret;
use crate::kubernetes::{ClusterDirectory, K8sError, K8sResult, SecretSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    InstallConfig,
    Kubeconfig,
}

impl ConfigKind {
    /// Key of the entry inside the hive secret
    pub fn key(&self) -> &'static str {
        match self {
            Self::InstallConfig => "install-config.yaml",
            Self::Kubeconfig => "kubeconfig",
        }
    }

    pub fn file_name(&self, cluster_name: &str) -> String {
        format!(
            "{}-{}.yaml",
            cluster_name,
            self.key().trim_end_matches(".yaml")
        )
    }
}

impl std::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for ConfigKind {
    type Err = K8sError;

    fn from_str(s: &str) -> K8sResult<Self> {
        match s {
            "install-config.yaml" | "install-config" => Ok(Self::InstallConfig),
            "kubeconfig" => Ok(Self::Kubeconfig),
            other => Err(K8sError::Validation(format!(
                "unknown configuration '{}', expected install-config or kubeconfig",
                other
            ))),
        }
    }
}

pub struct ConfigurationDownloader {
    clusters: Arc<dyn ClusterDirectory>,
    secrets: Arc<dyn SecretSource>,
}

impl ConfigurationDownloader {
    pub fn new(clusters: Arc<dyn ClusterDirectory>, secrets: Arc<dyn SecretSource>) -> Self {
        Self { clusters, secrets }
    }

    /// Read `kind` from the cluster's hive secret. A secret without the entry
    /// gives an empty file.
    pub async fn download_configuration(
        &self,
        cluster_name: &str,
        kind: ConfigKind,
    ) -> K8sResult<ConfigurationFile> {
        let cluster = self.clusters.managed_cluster(cluster_name).await?;

        let secret_name = cluster
            .hive_secrets
            .as_ref()
            .filter(|_| cluster.is_hive)
            .and_then(|s| match kind {
                ConfigKind::InstallConfig => s.install_config.clone(),
                ConfigKind::Kubeconfig => s.kubeconfig.clone(),
            })
            .ok_or_else(|| {
                K8sError::not_found(&format!("{} secret", kind), &cluster.namespace, cluster_name)
            })?;

        let secret = self.secrets.get_secret(&cluster.namespace, &secret_name).await?;
        let content = unpack_secret(&secret)
            .remove(kind.key())
            .unwrap_or_default();

        tracing::info!(cluster = %cluster_name, kind = %kind, secret = %secret_name, "Serving cluster configuration");

        Ok(ConfigurationFile {
            file_name: kind.file_name(cluster_name),
            content,
        })
    }
}
