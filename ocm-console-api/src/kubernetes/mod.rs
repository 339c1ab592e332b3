//! Kubernetes integration for the console
//!
//! Adapters over the hub cluster API:
//! - Secret lookups (import secrets, hive secrets)
//! - Managed cluster status and hive provisioning details
//! - ManagedClusterSetBinding listing
//! - SelfSubjectAccessReview permission checks (see `crate::rbac`)
//! - BareMetalAsset listing and deletion (see `crate::baremetal`)
//!
//! Each concern sits behind a trait so the mechanisms built on top can be
//! exercised with in-memory fakes.

pub mod client;
pub mod clusters;
pub mod error;
pub mod secrets;
pub mod types;

pub use client::K8sClient;
pub use clusters::ClusterDirectory;
pub use error::{K8sError, K8sResult};
pub use secrets::SecretSource;
