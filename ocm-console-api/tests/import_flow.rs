//! End-to-end import command flow against in-memory hub fakes
//!
//! Run with: cargo test --test import_flow

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use ocm_console_api::import::{ImportCommandService, RetryPolicy, SecretPoller};
use ocm_console_api::kubernetes::types::{ClusterSetBinding, ManagedClusterInfo};
use ocm_console_api::kubernetes::{ClusterDirectory, K8sError, K8sResult, SecretSource};
use ocm_console_api::shutdown::ShutdownCoordinator;
use ocm_console_common::{CliTool, ClusterStatus, ImportCommandStatus};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hub whose import secret shows up after `appears_after` lookups
struct SlowHub {
    lookups: AtomicUsize,
    appears_after: Option<usize>,
}

impl SlowHub {
    fn new(appears_after: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            lookups: AtomicUsize::new(0),
            appears_after,
        })
    }
}

#[async_trait]
impl SecretSource for SlowHub {
    async fn get_secret(&self, namespace: &str, name: &str) -> K8sResult<Secret> {
        if name != format!("{}-import", namespace) {
            return Err(K8sError::not_found("Secret", namespace, name));
        }

        let lookup = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        match self.appears_after {
            Some(n) if lookup >= n => Ok(Secret {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    namespace: Some(namespace.to_string()),
                    ..Default::default()
                },
                data: Some(BTreeMap::from([
                    ("crds.yaml".to_string(), ByteString(b"kind: CRD".to_vec())),
                    ("import.yaml".to_string(), ByteString(b"kind: Klusterlet".to_vec())),
                ])),
                ..Default::default()
            }),
            _ => Err(K8sError::not_found("Secret", namespace, name)),
        }
    }
}

#[async_trait]
impl ClusterDirectory for SlowHub {
    async fn managed_cluster(&self, name: &str) -> K8sResult<ManagedClusterInfo> {
        Ok(ManagedClusterInfo::new(name, ClusterStatus::PendingImport))
    }

    async fn cluster_set_bindings(&self, _namespace: &str) -> K8sResult<Vec<ClusterSetBinding>> {
        Ok(Vec::new())
    }
}

fn service(hub: Arc<SlowHub>, max_attempts: u32) -> ImportCommandService {
    let poller = SecretPoller::new(
        hub.clone(),
        RetryPolicy::new(max_attempts, Duration::from_millis(5)),
    );
    ImportCommandService::new(hub.clone(), hub, poller, "imported")
}

#[tokio::test]
async fn test_secret_created_while_polling() {
    let hub = SlowHub::new(Some(4));
    let shutdown = ShutdownCoordinator::new();

    let response = service(hub.clone(), 20)
        .import_command("spoke-1", CliTool::Oc, shutdown.cancel_token())
        .await
        .unwrap();

    assert_eq!(response.status, ImportCommandStatus::Ready);
    assert!(response.pending_import);
    let command = response.command.unwrap();
    assert!(command.contains("| oc create -f -"));
    assert!(command.contains("| oc apply -f -"));
    assert_eq!(hub.lookups.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_poll_gives_up_after_budget() {
    let hub = SlowHub::new(None);
    let shutdown = ShutdownCoordinator::new();

    let err = service(hub.clone(), 3)
        .import_command("spoke-1", CliTool::Kubectl, shutdown.cancel_token())
        .await
        .unwrap_err();

    assert!(matches!(err, K8sError::RetryExhausted { attempts: 3, .. }));
    assert_eq!(hub.lookups.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_shutdown_cancels_poll() {
    let hub = SlowHub::new(None);
    let shutdown = ShutdownCoordinator::new();
    let poller = SecretPoller::new(hub.clone(), RetryPolicy::new(1000, Duration::from_millis(20)));
    let imports = ImportCommandService::new(hub.clone(), hub.clone(), poller, "imported");

    let token = shutdown.cancel_token();
    let task = tokio::spawn(async move {
        imports
            .import_command("spoke-1", CliTool::Kubectl, token)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(K8sError::Cancelled)));
    assert!(hub.lookups.load(Ordering::SeqCst) < 1000);
}
