//! Per-row action permissions for the bare metal asset table
//!
//! Opening a row's action menu checks every table action for that row. Each
//! action runs as its own task and is applied in one write once all of its
//! sub-checks have settled. Moving to another row or closing the menu aborts
//! whatever is still in flight.

use ocm_console_common::rbac::{RbacAction, TableActionAccess};
use ocm_console_common::ResourceRef;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{aggregate, rbac_mapping, AccessReviewer};

/// Typed abort handle for one in-flight action check
#[derive(Debug)]
pub struct PendingCheck {
    action: RbacAction,
    generation: u64,
    handle: JoinHandle<()>,
}

impl PendingCheck {
    pub fn action(&self) -> RbacAction {
        self.action
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Result of toggling the action menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Menu opened and checks started under this generation
    Opened { generation: u64 },
    /// Menu closed; this many abort handles were invoked
    Closed { aborted: usize },
}

#[derive(Debug)]
struct CheckedAccess {
    generation: u64,
    target: Option<ResourceRef>,
    flags: TableActionAccess,
}

pub struct TableActionChecker {
    reviewer: Arc<dyn AccessReviewer>,
    actions: Vec<RbacAction>,
    access: Arc<RwLock<CheckedAccess>>,
    pending: Mutex<Vec<PendingCheck>>,
    generation: AtomicU64,
    open: AtomicBool,
}

impl TableActionChecker {
    pub fn new(reviewer: Arc<dyn AccessReviewer>) -> Self {
        Self::with_actions(reviewer, &RbacAction::TABLE_ACTIONS)
    }

    pub fn with_actions(reviewer: Arc<dyn AccessReviewer>, actions: &[RbacAction]) -> Self {
        Self {
            reviewer,
            actions: actions.to_vec(),
            access: Arc::new(RwLock::new(CheckedAccess {
                generation: 0,
                target: None,
                flags: TableActionAccess::disabled(actions),
            })),
            pending: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
            open: AtomicBool::new(false),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Vec<PendingCheck>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start checking every table action for `target`.
    ///
    /// Checks still running for the previous target are aborted and all flags
    /// drop back to `false` before the new checks start.
    pub async fn check(&self, target: &ResourceRef) -> u64 {
        let aborted = self.abort_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut access = self.access.write().await;
            access.generation = generation;
            access.target = Some(target.clone());
            access.flags = TableActionAccess::disabled(&self.actions);
        }

        debug!(resource = %target, generation, aborted, "Checking table actions");

        let checks: Vec<PendingCheck> = self
            .actions
            .iter()
            .map(|&action| {
                let attributes = rbac_mapping(action, Some(&target.name), Some(&target.namespace));
                let reviewer = Arc::clone(&self.reviewer);
                let access = Arc::clone(&self.access);

                let handle = tokio::spawn(async move {
                    let results = reviewer.review_all(&attributes).await;
                    let allowed = aggregate(&results);

                    let mut access = access.write().await;
                    if access.generation != generation {
                        debug!(%action, generation, "Dropping stale permission result");
                        return;
                    }
                    access.flags.set(action, allowed);
                });

                PendingCheck {
                    action,
                    generation,
                    handle,
                }
            })
            .collect();

        self.pending().extend(checks);
        generation
    }

    /// Abort every check that was started and not yet settled or aborted.
    /// Returns the number of abort handles invoked.
    pub fn abort_pending(&self) -> usize {
        let pending: Vec<PendingCheck> = self.pending().drain(..).collect();
        for check in &pending {
            check.abort();
        }
        pending.len()
    }

    /// Dropdown toggle: a closed menu opens and checks `target`; an open menu
    /// aborts pending checks and closes.
    pub async fn toggle(&self, target: &ResourceRef) -> ToggleOutcome {
        if self.open.swap(false, Ordering::SeqCst) {
            let aborted = self.abort_pending();
            debug!(resource = %target, aborted, "Action menu closed");
            ToggleOutcome::Closed { aborted }
        } else {
            self.open.store(true, Ordering::SeqCst);
            ToggleOutcome::Opened {
                generation: self.check(target).await,
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Wait for every pending check to finish or be aborted
    pub async fn settle(&self) {
        let pending: Vec<PendingCheck> = self.pending().drain(..).collect();
        for check in pending {
            if let Err(e) = check.handle.await {
                if !e.is_cancelled() {
                    warn!(action = %check.action, error = %e, "Permission check task failed");
                }
            }
        }
    }

    /// Current flags and the resource they belong to
    pub async fn access(&self) -> (Option<ResourceRef>, TableActionAccess) {
        let access = self.access.read().await;
        (access.target.clone(), access.flags.clone())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Drop for TableActionChecker {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
