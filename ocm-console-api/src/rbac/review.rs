//! Access reviews against the hub API server

use async_trait::async_trait;
use futures::future::join_all;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes as KubeResourceAttributes, SelfSubjectAccessReview,
    SelfSubjectAccessReviewSpec,
};
use kube::api::{Api, PostParams};
use ocm_console_common::rbac::ResourceAttributes;

use crate::kubernetes::{K8sClient, K8sResult};

/// Answers "may the current subject do this?"
#[async_trait]
pub trait AccessReviewer: Send + Sync {
    async fn review(&self, attributes: &ResourceAttributes) -> K8sResult<bool>;

    /// Issue every sub-check concurrently and return all settled results,
    /// in input order
    async fn review_all(&self, attributes: &[ResourceAttributes]) -> Vec<K8sResult<bool>> {
        join_all(attributes.iter().map(|a| self.review(a))).await
    }
}

fn to_review(attributes: &ResourceAttributes) -> SelfSubjectAccessReview {
    SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(KubeResourceAttributes {
                group: Some(attributes.group.clone()),
                resource: Some(attributes.resource.clone()),
                verb: Some(attributes.verb.clone()),
                namespace: attributes.namespace.clone(),
                name: attributes.name.clone(),
                subresource: attributes.subresource.clone(),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[async_trait]
impl AccessReviewer for K8sClient {
    async fn review(&self, attributes: &ResourceAttributes) -> K8sResult<bool> {
        let reviews: Api<SelfSubjectAccessReview> = Api::all(self.inner().clone());
        let created = reviews
            .create(&PostParams::default(), &to_review(attributes))
            .await?;

        let allowed = created.status.map(|s| s.allowed).unwrap_or(false);
        tracing::trace!(
            verb = %attributes.verb,
            resource = %attributes.resource,
            namespace = ?attributes.namespace,
            name = ?attributes.name,
            allowed,
            "Access review"
        );
        Ok(allowed)
    }
}
