//! Kubernetes client wrapper
//!
//! Wraps the kube-rs Client used to talk to the hub cluster.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;

use super::error::{K8sError, K8sResult};
use crate::config::KubernetesConfig;

/// Wrapper around kube-rs Client with hub connection details
#[derive(Clone)]
pub struct K8sClient {
    inner: Client,
    api_server: String,
}

impl K8sClient {
    /// Connect using the configured kubeconfig, falling back to kube's inference
    /// (KUBECONFIG, ~/.kube/config, then in-cluster service account)
    pub async fn connect(config: &KubernetesConfig) -> K8sResult<Self> {
        match &config.kubeconfig {
            Some(path) => Self::from_kubeconfig_file(path, config.context.as_deref()).await,
            None => Self::infer().await,
        }
    }

    /// Create client from a kubeconfig file with optional context
    pub async fn from_kubeconfig_file(path: &Path, context: Option<&str>) -> K8sResult<Self> {
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: context.map(String::from),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create config: {}", e)))?;

        Self::from_config(config)
    }

    /// Create client from whatever configuration the environment provides
    pub async fn infer() -> K8sResult<Self> {
        let config = Config::infer().await.map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to infer configuration: {}", e))
        })?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> K8sResult<Self> {
        let api_server = config.cluster_url.to_string();

        let client = Client::try_from(config)
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            inner: client,
            api_server,
        })
    }

    /// Get the inner kube-rs Client
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get API server URL
    pub fn api_server(&self) -> &str {
        &self.api_server
    }
}

impl std::fmt::Debug for K8sClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("K8sClient")
            .field("api_server", &self.api_server)
            .finish()
    }
}
