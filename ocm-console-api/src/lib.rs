//! OCM console API library
//!
//! Hub-side services behind the cluster management console: import command
//! rendering, bare metal asset inventory, RBAC checks, hive configuration
//! downloads and placement selector evaluation.

pub mod baremetal;
pub mod cache;
pub mod config;
pub mod error;
pub mod hive;
pub mod import;
pub mod kubernetes;
pub mod logging;
pub mod placement;
pub mod rbac;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, HubClients};
