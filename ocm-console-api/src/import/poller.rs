//! Import secret poller
//!
//! The import controller creates `<cluster>-import` in the cluster namespace a
//! short while after the cluster is registered. The poller looks it up until it
//! appears or the retry budget is spent.

use k8s_openapi::api::core::v1::Secret;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::retry::{CancelToken, RetryDecision, RetryMachine, RetryPolicy, Sleeper, TokioSleeper};
use crate::kubernetes::{K8sError, K8sResult, SecretSource};

/// Name of the import secret the controller creates for a cluster
pub fn import_secret_name(cluster_name: &str) -> String {
    format!("{}-import", cluster_name)
}

/// Sequential poller for a cluster's import secret
#[derive(Clone)]
pub struct SecretPoller {
    source: Arc<dyn SecretSource>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl SecretPoller {
    pub fn new(source: Arc<dyn SecretSource>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(source, Arc::new(TokioSleeper), policy)
    }

    pub fn with_sleeper(
        source: Arc<dyn SecretSource>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Poll `<cluster>/<cluster>-import` until found, exhausted or cancelled.
    ///
    /// Every failure, not-found or transport, spends one attempt. The next
    /// lookup starts only after the previous one settled and the delay passed.
    pub async fn poll(&self, cluster_name: &str, mut cancel: CancelToken) -> K8sResult<Secret> {
        if cluster_name.is_empty() {
            return Err(K8sError::Validation(
                "cluster name must not be empty".to_string(),
            ));
        }

        let namespace = cluster_name;
        let name = import_secret_name(cluster_name);
        let mut machine = RetryMachine::new(self.policy);

        loop {
            if cancel.is_cancelled() {
                debug!(cluster = %cluster_name, attempts = machine.attempts(), "Import secret poll cancelled");
                return Err(K8sError::Cancelled);
            }

            let attempt = machine.begin_attempt();
            let err = match self.source.get_secret(namespace, &name).await {
                Ok(secret) => {
                    machine.on_success();
                    info!(cluster = %cluster_name, attempt, "Import secret available");
                    return Ok(secret);
                }
                Err(err) => err,
            };

            match machine.on_failure() {
                RetryDecision::RetryAfter(delay) => {
                    debug!(
                        cluster = %cluster_name,
                        attempt,
                        error = %err,
                        "Import secret not available yet, retrying in {:?}",
                        delay
                    );
                    tokio::select! {
                        _ = self.sleeper.sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            debug!(cluster = %cluster_name, attempt, "Import secret poll cancelled while waiting");
                            return Err(K8sError::Cancelled);
                        }
                    }
                }
                RetryDecision::GiveUp => {
                    warn!(
                        cluster = %cluster_name,
                        attempts = machine.attempts(),
                        error = %err,
                        "Giving up on import secret"
                    );
                    return Err(K8sError::RetryExhausted {
                        attempts: machine.attempts(),
                        last_error: err.to_string(),
                    });
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::kubernetes::secrets::testing::secret_with;
    use std::sync::Mutex;
    use std::time::Duration;

    fn poller(source: Arc<FlakySource>, sleeper: Arc<dyn Sleeper>, attempts: u32) -> SecretPoller {
        SecretPoller::with_sleeper(
            source,
            sleeper,
            RetryPolicy::new(attempts, Duration::from_millis(500)),
        )
    }

    #[test]
    fn test_import_secret_name() {
        assert_eq!(import_secret_name("prod-east"), "prod-east-import");
    }

    #[tokio::test]
    async fn test_exhausts_after_exactly_n_attempts() {
        for budget in [1u32, 2, 5, 20] {
            let source = Arc::new(FlakySource::new(None, Secret::default()));
            let sleeper = Arc::new(RecordingSleeper::default());
            let result = poller(source.clone(), sleeper.clone(), budget)
                .poll("c1", CancelToken::never())
                .await;

            match result {
                Err(K8sError::RetryExhausted { attempts, last_error }) => {
                    assert_eq!(attempts, budget);
                    assert!(last_error.contains("c1-import"));
                }
                other => panic!("expected RetryExhausted, got {:?}", other),
            }
            assert_eq!(source.calls(), budget);
            // one wait between each pair of attempts
            assert_eq!(sleeper.sleeps.lock().unwrap().len() as u32, budget - 1);
        }
    }

    #[tokio::test]
    async fn test_resolves_on_attempt_k_without_further_lookups() {
        let secret = secret_with("c1", "c1-import", &[("crds.yaml", "X")]);
        for k in 1u32..=4 {
            let source = Arc::new(FlakySource::new(Some(k), secret.clone()));
            let sleeper = Arc::new(RecordingSleeper::default());
            let found = poller(source.clone(), sleeper.clone(), 4)
                .poll("c1", CancelToken::never())
                .await
                .unwrap();

            assert_eq!(found.metadata.name.as_deref(), Some("c1-import"));
            assert_eq!(source.calls(), k);
            assert_eq!(
                *sleeper.sleeps.lock().unwrap(),
                vec![Duration::from_millis(500); (k - 1) as usize]
            );
        }
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried_like_not_found() {
        let mut source = FlakySource::new(Some(3), Secret::default());
        source.not_found = false;
        let source = Arc::new(source);
        let result = poller(source.clone(), Arc::new(RecordingSleeper::default()), 20)
            .poll("c1", CancelToken::never())
            .await;
        assert!(result.is_ok());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_last_error_is_reported() {
        let mut source = FlakySource::new(None, Secret::default());
        source.not_found = false;
        let source = Arc::new(source);
        let err = poller(source, Arc::new(RecordingSleeper::default()), 3)
            .poll("c1", CancelToken::never())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset on call 3"));
    }

    #[tokio::test]
    async fn test_cancel_between_retries_stops_polling() {
        let source = Arc::new(FlakySource::new(None, Secret::default()));
        let (handle, token) = CancelToken::pair();
        let sleeper = Arc::new(CancellingSleeper {
            handle: Mutex::new(Some(handle)),
        });

        let result = poller(source.clone(), sleeper, 20).poll("c1", token).await;
        assert!(matches!(result, Err(K8sError::Cancelled)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_lookup() {
        let source = Arc::new(FlakySource::new(Some(1), Secret::default()));
        let (handle, token) = CancelToken::pair();
        handle.cancel();

        let result = poller(source.clone(), Arc::new(RecordingSleeper::default()), 20)
            .poll("c1", token)
            .await;
        assert!(matches!(result, Err(K8sError::Cancelled)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_cluster_name_is_rejected() {
        let source = Arc::new(FlakySource::new(Some(1), Secret::default()));
        let result = poller(source.clone(), Arc::new(RecordingSleeper::default()), 20)
            .poll("", CancelToken::never())
            .await;
        assert!(matches!(result, Err(K8sError::Validation(_))));
        assert_eq!(source.calls(), 0);
    }
}
