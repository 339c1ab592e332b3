//! Kubernetes error types and ApiError mapping
//!
//! Maps kube-rs errors and polling failures to console API errors.

use crate::error::ApiError;
use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// Kubernetes resource not found
    #[error("Resource not found: {kind}/{name} in namespace {namespace}")]
    ResourceNotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    /// Error from kube-rs client
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Invalid kubeconfig
    #[error("Invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Polling gave up after the retry budget was spent
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// Operation abandoned by its caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Resource exists but does not have the expected shape
    #[error("Malformed resource: {0}")]
    Malformed(String),

    /// Internal system error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl K8sError {
    pub fn not_found(kind: &str, namespace: &str, name: &str) -> Self {
        K8sError::ResourceNotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// True for 404 responses and for resources reported missing by adapters
    pub fn is_not_found(&self) -> bool {
        match self {
            K8sError::ResourceNotFound { .. } => true,
            K8sError::KubeError(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    /// Map a kube error for a named resource, turning 404 into `ResourceNotFound`
    pub fn from_lookup(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => Self::not_found(kind, namespace, name),
            kube::Error::Api(resp) if resp.code == 403 => K8sError::Forbidden(resp.message),
            other => K8sError::KubeError(other),
        }
    }
}

impl From<K8sError> for ApiError {
    fn from(err: K8sError) -> Self {
        match err {
            K8sError::ResourceNotFound {
                kind,
                name,
                namespace,
            } => ApiError::NotFound(format!(
                "{}/{} not found in namespace {}",
                kind, name, namespace
            )),
            K8sError::KubeError(kube::Error::Api(resp)) => match resp.code {
                401 => ApiError::AuthenticationFailed,
                403 => ApiError::Forbidden(resp.message),
                404 => ApiError::NotFound(resp.message),
                409 => ApiError::Conflict(resp.message),
                422 => ApiError::ValidationError(resp.message),
                _ => ApiError::Internal(format!("Kubernetes error: {}", resp.message)),
            },
            K8sError::KubeError(e) => {
                ApiError::ServiceUnavailable(format!("Kubernetes API unreachable: {}", e))
            }
            K8sError::InvalidKubeconfig(msg) => ApiError::Internal(msg),
            K8sError::Forbidden(msg) => ApiError::Forbidden(msg),
            K8sError::Validation(msg) => ApiError::ValidationError(msg),
            K8sError::RetryExhausted { last_error, .. } => ApiError::ServiceUnavailable(last_error),
            K8sError::Cancelled => {
                ApiError::ServiceUnavailable("Request cancelled by server shutdown".to_string())
            }
            K8sError::Malformed(msg) => ApiError::Internal(format!("Malformed resource: {}", msg)),
            K8sError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;
