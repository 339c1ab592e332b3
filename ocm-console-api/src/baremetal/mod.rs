//! Bare metal asset listing and deletion
//!
//! The listing is served from a TTL cache that a background task refreshes
//! periodically. Deletions invalidate it so the next read goes to the hub.

pub mod store;
pub mod types;

pub use store::BareMetalAssetStore;
pub use types::{current_condition, status_message, BareMetalAsset, StatusMessage};

use futures::future::join_all;
use ocm_console_common::{BareMetalAssetRow, DeleteOutcome, ResourceRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::import::CancelToken;
use crate::kubernetes::K8sResult;

pub struct BareMetalAssetService {
    store: Arc<dyn BareMetalAssetStore>,
    cache: TtlCache<Vec<BareMetalAsset>>,
}

impl BareMetalAssetService {
    pub fn new(store: Arc<dyn BareMetalAssetStore>, cache: TtlCache<Vec<BareMetalAsset>>) -> Self {
        Self { store, cache }
    }

    /// Cached assets while fresh, otherwise a new listing
    pub async fn list(&self) -> K8sResult<Vec<BareMetalAsset>> {
        if let Some(assets) = self.cache.get() {
            debug!(count = assets.len(), "Serving bare metal assets from cache");
            return Ok(assets);
        }
        self.refresh().await
    }

    pub async fn rows(&self) -> K8sResult<Vec<BareMetalAssetRow>> {
        Ok(self.list().await?.iter().map(BareMetalAsset::to_row).collect())
    }

    /// List from the hub and overwrite the cache
    pub async fn refresh(&self) -> K8sResult<Vec<BareMetalAsset>> {
        let assets = self.store.list().await?;
        debug!(count = assets.len(), "Refreshed bare metal assets");
        self.cache.put(assets.clone());
        Ok(assets)
    }

    pub async fn delete(&self, resource: &ResourceRef) -> K8sResult<()> {
        let result = self.store.delete(&resource.namespace, &resource.name).await;
        self.cache.invalidate();
        result
    }

    /// Delete every resource concurrently; one outcome per input, in order
    pub async fn delete_many(&self, resources: &[ResourceRef]) -> Vec<DeleteOutcome> {
        let results = join_all(
            resources
                .iter()
                .map(|r| self.store.delete(&r.namespace, &r.name)),
        )
        .await;
        self.cache.invalidate();

        let outcomes: Vec<DeleteOutcome> = resources
            .iter()
            .zip(results)
            .map(|(resource, result)| match result {
                Ok(()) => DeleteOutcome {
                    resource: resource.clone(),
                    deleted: true,
                    error: None,
                },
                Err(e) => {
                    warn!(resource = %resource, error = %e, "Failed to delete bare metal asset");
                    DeleteOutcome {
                        resource: resource.clone(),
                        deleted: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        info!(
            requested = resources.len(),
            deleted = outcomes.iter().filter(|o| o.deleted).count(),
            "Batch delete finished"
        );
        outcomes
    }

    /// Refresh every `interval` until `cancel` fires. The first refresh runs
    /// immediately.
    pub fn start_polling(self: &Arc<Self>, interval: Duration, mut cancel: CancelToken) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs_f64(), "Bare metal asset polling started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = service.refresh().await {
                            warn!(error = %e, "Bare metal asset refresh failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        info!("Bare metal asset polling stopped");
                        return;
                    }
                }
            }
        })
    }
}
