//! Application State
//!
//! Shared state for the console API server

use std::sync::Arc;

use crate::baremetal::{BareMetalAssetService, BareMetalAssetStore};
use crate::cache::TtlCache;
use crate::config::ConsoleConfig;
use crate::hive::ConfigurationDownloader;
use crate::import::{ImportCommandService, SecretPoller};
use crate::kubernetes::{ClusterDirectory, K8sClient, SecretSource};
use crate::rbac::AccessReviewer;
use crate::shutdown::ShutdownCoordinator;

/// Hub access, one trait object per concern
#[derive(Clone)]
pub struct HubClients {
    pub secrets: Arc<dyn SecretSource>,
    pub clusters: Arc<dyn ClusterDirectory>,
    pub reviewer: Arc<dyn AccessReviewer>,
    pub assets: Arc<dyn BareMetalAssetStore>,
}

impl HubClients {
    pub fn from_client(client: K8sClient) -> Self {
        let client = Arc::new(client);
        Self {
            secrets: client.clone(),
            clusters: client.clone(),
            reviewer: client.clone(),
            assets: client,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConsoleConfig>,
    pub hub: HubClients,
    pub imports: Arc<ImportCommandService>,
    pub bare_metal: Arc<BareMetalAssetService>,
    pub configurations: Arc<ConfigurationDownloader>,
    pub shutdown: ShutdownCoordinator,
}

impl AppState {
    pub fn new(config: ConsoleConfig, hub: HubClients, shutdown: ShutdownCoordinator) -> Self {
        let poller = SecretPoller::new(hub.secrets.clone(), config.import.retry_policy());
        let imports = ImportCommandService::new(
            hub.clusters.clone(),
            hub.secrets.clone(),
            poller,
            config.import.already_imported_message.clone(),
        );
        let bare_metal = BareMetalAssetService::new(
            hub.assets.clone(),
            TtlCache::new(config.cache.ttl()),
        );
        let configurations =
            ConfigurationDownloader::new(hub.clusters.clone(), hub.secrets.clone());

        Self {
            config: Arc::new(config),
            imports: Arc::new(imports),
            bare_metal: Arc::new(bare_metal),
            configurations: Arc::new(configurations),
            hub,
            shutdown,
        }
    }
}
