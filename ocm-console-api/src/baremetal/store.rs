//! BareMetalAsset access on the hub

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams};

use super::types::BareMetalAsset;
use crate::kubernetes::types::{bare_metal_asset_resource, from_dynamic};
use crate::kubernetes::{K8sClient, K8sError, K8sResult};

#[async_trait]
pub trait BareMetalAssetStore: Send + Sync {
    /// Assets across all namespaces
    async fn list(&self) -> K8sResult<Vec<BareMetalAsset>>;

    async fn delete(&self, namespace: &str, name: &str) -> K8sResult<()>;
}

#[async_trait]
impl BareMetalAssetStore for K8sClient {
    async fn list(&self) -> K8sResult<Vec<BareMetalAsset>> {
        let ar = bare_metal_asset_resource();
        let assets: Api<DynamicObject> = Api::all_with(self.inner().clone(), &ar);
        let list = assets.list(&ListParams::default()).await?;

        list.items.into_iter().map(from_dynamic).collect()
    }

    async fn delete(&self, namespace: &str, name: &str) -> K8sResult<()> {
        let ar = bare_metal_asset_resource();
        let assets: Api<DynamicObject> = Api::namespaced_with(self.inner().clone(), namespace, &ar);
        assets
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| K8sError::from_lookup(e, "BareMetalAsset", namespace, name))?;

        tracing::info!(namespace = %namespace, name = %name, "Deleted BareMetalAsset");
        Ok(())
    }
}
