//! Console action to RBAC sub-check mapping

use ocm_console_common::rbac::{RbacAction, ResourceAttributes};

use crate::kubernetes::types::{INVENTORY_GROUP, MANAGED_CLUSTER_GROUP};

const BARE_METAL_ASSETS: &str = "baremetalassets";

/// Sub-checks that must all pass for `action` on the given resource.
///
/// Empty `name` or `namespace` widen the check to the whole scope.
pub fn rbac_mapping(
    action: RbacAction,
    name: Option<&str>,
    namespace: Option<&str>,
) -> Vec<ResourceAttributes> {
    match action {
        RbacAction::BmaEdit => vec![
            ResourceAttributes::new(INVENTORY_GROUP, BARE_METAL_ASSETS, "patch")
                .in_namespace(namespace)
                .named(name),
            // BMC credentials live in a secret beside the asset
            ResourceAttributes::new("", "secrets", "patch").in_namespace(namespace),
        ],
        RbacAction::BmaDelete => vec![
            ResourceAttributes::new(INVENTORY_GROUP, BARE_METAL_ASSETS, "delete")
                .in_namespace(namespace)
                .named(name),
        ],
        RbacAction::BmaCreate => vec![
            ResourceAttributes::new(INVENTORY_GROUP, BARE_METAL_ASSETS, "create")
                .in_namespace(namespace),
            ResourceAttributes::new("", "secrets", "create").in_namespace(namespace),
        ],
        RbacAction::ClusterCreate => vec![ResourceAttributes::new(
            MANAGED_CLUSTER_GROUP,
            "managedclusters",
            "create",
        )],
        RbacAction::SecretGet => vec![ResourceAttributes::new("", "secrets", "get")
            .in_namespace(namespace)
            .named(name)],
    }
}
