//! RBAC permission checks
//!
//! Console actions map to one or more access reviews ([`rbac_mapping`]).
//! An action is allowed only when every one of its sub-checks allows it.
//! Failed sub-checks are logged and count as denied.

pub mod checker;
pub mod mapping;
pub mod review;

pub use checker::{PendingCheck, TableActionChecker, ToggleOutcome};
pub use mapping::rbac_mapping;
pub use review::AccessReviewer;

use ocm_console_common::rbac::{
    AccessReviewResponse, AccessReviewResult, RbacAction, ResourceAttributes,
};
use tracing::error;

use crate::kubernetes::K8sResult;

/// True iff there is at least one result and every result is `Ok(true)`
pub fn aggregate(results: &[K8sResult<bool>]) -> bool {
    if results.is_empty() {
        return false;
    }

    let mut allowed = true;
    for result in results {
        match result {
            Ok(true) => {}
            Ok(false) => allowed = false,
            Err(e) => {
                error!(error = %e, "Access review failed");
                allowed = false;
            }
        }
    }
    allowed
}

/// Run a batch of access reviews and report each result plus the aggregate
pub async fn review_batch(
    reviewer: &dyn AccessReviewer,
    checks: Vec<ResourceAttributes>,
) -> AccessReviewResponse {
    let settled = reviewer.review_all(&checks).await;
    let allowed = aggregate(&settled);

    let results = checks
        .into_iter()
        .zip(settled)
        .map(|(attributes, result)| match result {
            Ok(allowed) => AccessReviewResult {
                attributes,
                allowed,
                error: None,
            },
            Err(e) => AccessReviewResult {
                attributes,
                allowed: false,
                error: Some(e.to_string()),
            },
        })
        .collect();

    AccessReviewResponse { results, allowed }
}

/// Whether creating clusters (and with them bare metal assets) is off limits
/// for the current subject. A failed check counts as restricted.
pub async fn creation_restricted(reviewer: &dyn AccessReviewer) -> bool {
    let checks = rbac_mapping(RbacAction::ClusterCreate, None, None);
    let Some(check) = checks.first() else {
        return true;
    };

    match reviewer.review(check).await {
        Ok(allowed) => !allowed,
        Err(e) => {
            error!(error = %e, "Cluster creation access review failed");
            true
        }
    }
}

/// Whether `action` is allowed on the given resource
pub async fn is_allowed(
    reviewer: &dyn AccessReviewer,
    action: RbacAction,
    name: Option<&str>,
    namespace: Option<&str>,
) -> bool {
    let checks = rbac_mapping(action, name, namespace);
    aggregate(&reviewer.review_all(&checks).await)
}
