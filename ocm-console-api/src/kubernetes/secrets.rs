//! Secret lookups
//!
//! The console only ever reads secrets; they are created by the
//! cluster-management controllers.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use std::collections::BTreeMap;

use super::client::K8sClient;
use super::error::{K8sError, K8sResult};

/// Read access to namespaced secrets
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> K8sResult<Secret>;

    /// Like `get_secret`, but a missing secret is `Ok(None)`
    async fn find_secret(&self, namespace: &str, name: &str) -> K8sResult<Option<Secret>> {
        match self.get_secret(namespace, name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SecretSource for K8sClient {
    async fn get_secret(&self, namespace: &str, name: &str) -> K8sResult<Secret> {
        let secrets: Api<Secret> = Api::namespaced(self.inner().clone(), namespace);
        secrets
            .get(name)
            .await
            .map_err(|e| K8sError::from_lookup(e, "Secret", namespace, name))
    }
}

/// Base64 form of a data entry, as it appears in the secret manifest.
/// A missing key yields an empty string.
pub fn data_base64(secret: &Secret, key: &str) -> String {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|bytes| STANDARD.encode(&bytes.0))
        .unwrap_or_default()
}

/// Decoded text of every entry, `stringData` taking precedence over `data`
pub fn unpack_secret(secret: &Secret) -> BTreeMap<String, String> {
    let mut unpacked: BTreeMap<String, String> = secret
        .data
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), String::from_utf8_lossy(&v.0).into_owned()))
        .collect();

    if let Some(string_data) = &secret.string_data {
        unpacked.extend(string_data.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    unpacked
}


#[cfg(test)]
mod tests {
    use super::testing::secret_with;
    use super::*;

    #[test]
    fn test_data_base64() {
        let secret = secret_with("c1", "c1-import", &[("crds.yaml", "X")]);
        assert_eq!(data_base64(&secret, "crds.yaml"), STANDARD.encode("X"));
        assert_eq!(data_base64(&secret, "import.yaml"), "");
        assert_eq!(data_base64(&Secret::default(), "crds.yaml"), "");
    }

    #[test]
    fn test_unpack_secret() {
        let mut secret = secret_with("c1", "install", &[("install-config.yaml", "apiVersion: v1")]);
        let unpacked = unpack_secret(&secret);
        assert_eq!(unpacked["install-config.yaml"], "apiVersion: v1");

        secret.string_data = Some(BTreeMap::from([(
            "install-config.yaml".to_string(),
            "override".to_string(),
        )]));
        assert_eq!(unpack_secret(&secret)["install-config.yaml"], "override");
    }
}
