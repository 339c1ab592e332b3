//! Manual cluster import
//!
//! Decides whether a managed cluster should be offered an import command and,
//! if so, waits for its import secret and renders the command.

pub mod command;
pub mod poller;
pub mod retry;

pub use command::build_import_command;
pub use poller::{import_secret_name, SecretPoller};
pub use retry::{CancelHandle, CancelToken, PollState, RetryPolicy, Sleeper, TokioSleeper};

use ocm_console_common::{CliTool, ClusterStatus, ImportCommandResponse, ImportCommandStatus};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::kubernetes::{ClusterDirectory, K8sResult, SecretSource};

/// Secret whose presence means the import controller imports the cluster itself
pub const AUTO_IMPORT_SECRET: &str = "auto-import-secret";

pub const DEFAULT_ALREADY_IMPORTED_MESSAGE: &str = "The cluster is already imported.";

pub struct ImportCommandService {
    clusters: Arc<dyn ClusterDirectory>,
    secrets: Arc<dyn SecretSource>,
    poller: SecretPoller,
    already_imported_message: String,
}

impl ImportCommandService {
    pub fn new(
        clusters: Arc<dyn ClusterDirectory>,
        secrets: Arc<dyn SecretSource>,
        poller: SecretPoller,
        already_imported_message: impl Into<String>,
    ) -> Self {
        Self {
            clusters,
            secrets,
            poller,
            already_imported_message: already_imported_message.into(),
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn import_command(
        &self,
        cluster_name: &str,
        tool: CliTool,
        cancel: CancelToken,
    ) -> K8sResult<ImportCommandResponse> {
        let cluster = self.clusters.managed_cluster(cluster_name).await?;

        let response = |status, command: Option<String>, message: Option<String>| ImportCommandResponse {
            cluster: cluster.name.clone(),
            tool,
            status,
            command,
            pending_import: cluster.status == ClusterStatus::PendingImport,
            message,
        };

        if cluster.is_hive {
            debug!("Cluster is provisioned by hive, no import command");
            return Ok(response(
                ImportCommandStatus::NotApplicable,
                None,
                Some("Cluster was provisioned by hive and is imported automatically".to_string()),
            ));
        }

        if self
            .secrets
            .find_secret(&cluster.namespace, AUTO_IMPORT_SECRET)
            .await?
            .is_some()
        {
            debug!("Cluster has an auto-import secret");
            return Ok(response(
                ImportCommandStatus::AutoImport,
                None,
                Some("Cluster is being imported with the auto-import secret".to_string()),
            ));
        }

        if !cluster.status.awaits_import() {
            debug!(status = %cluster.status, "Cluster is not waiting for import");
            return Ok(response(
                ImportCommandStatus::NotApplicable,
                None,
                Some(format!("Cluster status is {}", cluster.status)),
            ));
        }

        let secret = self.poller.poll(&cluster.name, cancel).await?;
        let command = build_import_command(&secret, &self.already_imported_message, tool);

        Ok(response(ImportCommandStatus::Ready, Some(command), None))
    }
}
