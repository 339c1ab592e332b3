//! HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use ocm_console_common::rbac::{
    AccessReviewRequest, AccessReviewResponse, CreationPermission, RbacAction, TableActionAccess,
};
use ocm_console_common::{
    BareMetalAssetRow, CliTool, ConfigurationFile, DeleteOutcome, DeleteRequest,
    ImportCommandResponse, ResourceRef, SelectorEvaluateRequest, SelectorEvaluateResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::hive::ConfigKind;
use crate::placement;
use crate::rbac::{self, TableActionChecker};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(cluster_routes())
        .merge(bare_metal_asset_routes())
        .route("/api/access-reviews", post(access_reviews))
        .route("/api/cluster-selector/evaluate", post(evaluate_cluster_selector))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn cluster_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/clusters/:name/import-command", get(import_command))
        .route("/api/clusters/:name/configuration/:kind", get(download_configuration))
}

fn bare_metal_asset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bare-metal-assets", get(list_bare_metal_assets))
        .route("/api/bare-metal-assets/delete", post(delete_bare_metal_assets))
        .route("/api/bare-metal-assets/permissions", get(bare_metal_asset_permissions))
        .route(
            "/api/bare-metal-assets/:namespace/:name",
            delete(delete_bare_metal_asset),
        )
        .route(
            "/api/bare-metal-assets/:namespace/:name/actions",
            get(bare_metal_asset_actions),
        )
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
struct ImportCommandQuery {
    #[serde(default)]
    tool: CliTool,
}

async fn import_command(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ImportCommandQuery>,
) -> Result<Json<ImportCommandResponse>, ApiError> {
    let response = state
        .imports
        .import_command(&name, query.tool, state.shutdown.cancel_token())
        .await?;
    Ok(Json(response))
}

async fn download_configuration(
    State(state): State<Arc<AppState>>,
    Path((name, kind)): Path<(String, String)>,
) -> Result<Json<ConfigurationFile>, ApiError> {
    let kind: ConfigKind = kind.parse()?;

    let allowed = rbac::is_allowed(
        state.hub.reviewer.as_ref(),
        RbacAction::SecretGet,
        None,
        Some(name.as_str()),
    )
    .await;
    if !allowed {
        return Err(ApiError::permission_denied(
            RbacAction::SecretGet,
            format!("secrets in namespace {}", name),
        ));
    }

    let file = state.configurations.download_configuration(&name, kind).await?;
    Ok(Json(file))
}

async fn access_reviews(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AccessReviewRequest>,
) -> Json<AccessReviewResponse> {
    Json(rbac::review_batch(state.hub.reviewer.as_ref(), request.checks).await)
}

async fn list_bare_metal_assets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BareMetalAssetRow>>, ApiError> {
    Ok(Json(state.bare_metal.rows().await?))
}

async fn delete_bare_metal_assets(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Vec<DeleteOutcome>>, ApiError> {
    if request.resources.is_empty() {
        return Err(ApiError::invalid_input("resources", "nothing to delete"));
    }
    Ok(Json(state.bare_metal.delete_many(&request.resources).await))
}

async fn delete_bare_metal_asset(
    State(state): State<Arc<AppState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .bare_metal
        .delete(&ResourceRef::new(namespace, name))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bare_metal_asset_actions(
    State(state): State<Arc<AppState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Json<TableActionAccess> {
    let checker = TableActionChecker::new(state.hub.reviewer.clone());
    checker.check(&ResourceRef::new(namespace, name)).await;
    checker.settle().await;

    let (_, access) = checker.access().await;
    Json(access)
}

async fn bare_metal_asset_permissions(State(state): State<Arc<AppState>>) -> Json<CreationPermission> {
    Json(CreationPermission {
        creation_restricted: rbac::creation_restricted(state.hub.reviewer.as_ref()).await,
    })
}

async fn evaluate_cluster_selector(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectorEvaluateRequest>,
) -> Result<Json<SelectorEvaluateResponse>, ApiError> {
    Ok(Json(placement::evaluate(request, state.hub.clusters.as_ref()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baremetal::types::testing::asset;
    use crate::baremetal::{BareMetalAsset, BareMetalAssetStore};
    use crate::config::ConsoleConfig;
    use crate::kubernetes::secrets::testing::secret_with;
    use crate::kubernetes::types::{ClusterSetBinding, HiveSecrets, ManagedClusterInfo};
    use crate::kubernetes::{ClusterDirectory, K8sError, K8sResult, SecretSource};
    use crate::rbac::AccessReviewer;
    use crate::shutdown::ShutdownCoordinator;
    use crate::state::HubClients;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use k8s_openapi::api::core::v1::Secret;
    use ocm_console_common::rbac::ResourceAttributes;
    use ocm_console_common::ClusterStatus;
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeHub {
        clusters: HashMap<String, ManagedClusterInfo>,
        secrets: HashMap<(String, String), Secret>,
        bindings: Vec<ClusterSetBinding>,
        assets: Mutex<Vec<BareMetalAsset>>,
        denied: HashSet<(String, String)>,
    }

    impl FakeHub {
        fn with_cluster(mut self, cluster: ManagedClusterInfo) -> Self {
            self.clusters.insert(cluster.name.clone(), cluster);
            self
        }

        fn with_secret(mut self, secret: Secret) -> Self {
            let key = (
                secret.metadata.namespace.clone().unwrap_or_default(),
                secret.metadata.name.clone().unwrap_or_default(),
            );
            self.secrets.insert(key, secret);
            self
        }

        fn deny(mut self, resource: &str, verb: &str) -> Self {
            self.denied.insert((resource.to_string(), verb.to_string()));
            self
        }
    }

    #[async_trait]
    impl SecretSource for FakeHub {
        async fn get_secret(&self, namespace: &str, name: &str) -> K8sResult<Secret> {
            self.secrets
                .get(&(namespace.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| K8sError::not_found("Secret", namespace, name))
        }
    }

    #[async_trait]
    impl ClusterDirectory for FakeHub {
        async fn managed_cluster(&self, name: &str) -> K8sResult<ManagedClusterInfo> {
            self.clusters
                .get(name)
                .cloned()
                .ok_or_else(|| K8sError::not_found("ManagedCluster", "", name))
        }

        async fn cluster_set_bindings(&self, namespace: &str) -> K8sResult<Vec<ClusterSetBinding>> {
            Ok(self
                .bindings
                .iter()
                .filter(|b| b.namespace == namespace)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl AccessReviewer for FakeHub {
        async fn review(&self, attributes: &ResourceAttributes) -> K8sResult<bool> {
            Ok(!self
                .denied
                .contains(&(attributes.resource.clone(), attributes.verb.clone())))
        }
    }

    #[async_trait]
    impl BareMetalAssetStore for FakeHub {
        async fn list(&self) -> K8sResult<Vec<BareMetalAsset>> {
            Ok(self.assets.lock().unwrap().clone())
        }

        async fn delete(&self, namespace: &str, name: &str) -> K8sResult<()> {
            let mut assets = self.assets.lock().unwrap();
            let before = assets.len();
            assets.retain(|a| !(a.namespace() == namespace && a.name() == name));
            if assets.len() == before {
                return Err(K8sError::not_found("BareMetalAsset", namespace, name));
            }
            Ok(())
        }
    }

    fn app(hub: FakeHub) -> Router {
        let hub = Arc::new(hub);
        let clients = HubClients {
            secrets: hub.clone(),
            clusters: hub.clone(),
            reviewer: hub.clone(),
            assets: hub,
        };
        let mut config = ConsoleConfig::default();
        config.import.max_attempts = 2;
        config.import.retry_delay_ms = 1;
        build_router(AppState::new(config, clients, ShutdownCoordinator::new()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(request).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn pending_hub() -> FakeHub {
        FakeHub::default()
            .with_cluster(ManagedClusterInfo::new("c1", ClusterStatus::PendingImport))
            .with_secret(secret_with("c1", "c1-import", &[("crds.yaml", "X"), ("import.yaml", "Y")]))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(FakeHub::default()), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_import_command_ready() {
        let (status, body) = send(app(pending_hub()), get("/api/clusters/c1/import-command?tool=oc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["tool"], "oc");
        assert_eq!(body["pending_import"], true);
        assert!(body["command"].as_str().unwrap().starts_with("echo \"WA==\" | base64 -d | oc create -f -"));
    }

    #[tokio::test]
    async fn test_import_command_exhausted_is_503() {
        let hub = FakeHub::default()
            .with_cluster(ManagedClusterInfo::new("c1", ClusterStatus::ImportFailed));
        let (status, body) = send(app(hub), get("/api/clusters/c1/import-command")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
        assert!(body["message"].as_str().unwrap().contains("c1-import"));
    }

    #[tokio::test]
    async fn test_import_command_unknown_cluster_is_404() {
        let (status, body) = send(app(FakeHub::default()), get("/api/clusters/nope/import-command")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_configuration_download_gated_by_secret_get() {
        let mut cluster = ManagedClusterInfo::new("c1", ClusterStatus::Ready);
        cluster.is_hive = true;
        cluster.hive_secrets = Some(HiveSecrets {
            install_config: Some("c1-install".to_string()),
            kubeconfig: None,
        });
        let hub = || {
            FakeHub::default()
                .with_cluster(cluster.clone())
                .with_secret(secret_with("c1", "c1-install", &[("install-config.yaml", "baseDomain: x\n")]))
        };

        let (status, body) = send(app(hub()), get("/api/clusters/c1/configuration/install-config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file_name"], "c1-install-config.yaml");
        assert_eq!(body["content"], "baseDomain: x\n");

        let (status, _) = send(
            app(hub().deny("secrets", "get")),
            get("/api/clusters/c1/configuration/install-config"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(app(hub()), get("/api/clusters/c1/configuration/pull-secret")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_access_reviews_aggregate() {
        let hub = FakeHub::default().deny("secrets", "delete");
        let (status, body) = send(
            app(hub),
            post_json(
                "/api/access-reviews",
                json!({"checks": [
                    {"resource": "secrets", "verb": "get", "namespace": "c1"},
                    {"resource": "secrets", "verb": "delete", "namespace": "c1"}
                ]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], false);
        assert_eq!(body["results"][0]["allowed"], true);
        assert_eq!(body["results"][1]["allowed"], false);
    }

    #[tokio::test]
    async fn test_bare_metal_asset_listing_and_deletion() {
        let hub = FakeHub::default();
        *hub.assets.lock().unwrap() = vec![asset("infra", "bma-1"), asset("infra", "bma-2")];
        let app = app(hub);

        let (status, body) = send(app.clone(), get("/api/bare-metal-assets")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["cluster"], "-");

        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/bare-metal-assets/delete",
                json!({"resources": [
                    {"namespace": "infra", "name": "bma-1"},
                    {"namespace": "infra", "name": "missing"}
                ]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["deleted"], true);
        assert_eq!(body[1]["deleted"], false);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/bare-metal-assets/infra/bma-2")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(app.clone(), get("/api/bare-metal-assets")).await;
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = send(app, post_json("/api/bare-metal-assets/delete", json!({"resources": []}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_bare_metal_asset_actions_and_permissions() {
        let hub = FakeHub::default()
            .deny("secrets", "patch")
            .deny("managedclusters", "create");
        let app = app(hub);

        let (status, body) = send(app.clone(), get("/api/bare-metal-assets/infra/bma-1/actions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"bma.edit": false, "bma.delete": true}));

        let (status, body) = send(app, get("/api/bare-metal-assets/permissions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["creation_restricted"], true);
    }

    #[tokio::test]
    async fn test_cluster_selector_evaluate() {
        let mut hub = FakeHub::default();
        hub.bindings.push(ClusterSetBinding {
            name: "east".to_string(),
            namespace: "apps".to_string(),
        });

        let (status, body) = send(
            app(hub),
            post_json(
                "/api/cluster-selector/evaluate",
                json!({
                    "mode": true,
                    "labels": [
                        {"id": 0, "name": "env", "value": "prod", "valid": true},
                        {"id": 1, "name": "env", "value": "dev", "valid": true}
                    ],
                    "cluster_sets": ["east", "west"],
                    "template_yaml": "kind: Subscription\nmetadata:\n  name: s\n  namespace: apps\n"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["namespace"], "apps");
        assert_eq!(body["exceptions"][0]["control_id"], "labelName-1");
        assert_eq!(body["cluster_sets"][0], json!({"name": "east", "has_binding": true}));
        assert_eq!(body["cluster_sets"][1], json!({"name": "west", "has_binding": false}));
    }
}
