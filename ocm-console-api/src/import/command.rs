//! Import command assembly

use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::core::v1::Secret;
use ocm_console_common::CliTool;

use crate::kubernetes::secrets::data_base64;

pub const CRDS_KEY: &str = "crds.yaml";
pub const IMPORT_KEY: &str = "import.yaml";

/// Build the shell pipeline that applies the import manifests on the target
/// cluster.
///
/// CRDs are created first; `create` failing because they already exist is
/// tolerated. When the import manifests cannot be applied, the pipeline prints
/// `already_imported` instead. Missing secret keys produce empty segments.
pub fn build_import_command(secret: &Secret, already_imported: &str, tool: CliTool) -> String {
    let crds = data_base64(secret, CRDS_KEY);
    let import = data_base64(secret, IMPORT_KEY);
    let fallback = STANDARD.encode(already_imported);
    let tool = tool.binary();

    format!(
        "echo \"{crds}\" | base64 -d | {tool} create -f - || test $? -eq 0 && sleep 2 && \
         echo \"{import}\" | base64 -d | {tool} apply -f - || echo \"{fallback}\" | base64 -d"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::secrets::testing::secret_with;

    const MESSAGE: &str = "The cluster is already imported.";

    #[test]
    fn test_kubectl_command_literal() {
        let secret = secret_with("c1", "c1-import", &[("crds.yaml", "X"), ("import.yaml", "Y")]);
        let command = build_import_command(&secret, MESSAGE, CliTool::Kubectl);

        let expected = format!(
            "echo \"{}\" | base64 -d | kubectl create -f - || test $? -eq 0 && sleep 2 && echo \"{}\" | base64 -d | kubectl apply -f - || echo \"{}\" | base64 -d",
            STANDARD.encode("X"),
            STANDARD.encode("Y"),
            STANDARD.encode(MESSAGE)
        );
        assert_eq!(command, expected);
        assert!(command.starts_with(&format!(
            "echo \"{}\" | base64 -d | kubectl create -f -",
            STANDARD.encode("X")
        )));
    }

    #[test]
    fn test_oc_tool_used_in_both_steps() {
        let secret = secret_with("c1", "c1-import", &[("crds.yaml", "X"), ("import.yaml", "Y")]);
        let command = build_import_command(&secret, MESSAGE, CliTool::Oc);

        assert!(command.contains("| oc create -f -"));
        assert!(command.contains("| oc apply -f -"));
        assert!(!command.contains("kubectl"));
    }

    #[test]
    fn test_missing_keys_give_empty_segments() {
        let secret = secret_with("c1", "c1-import", &[]);
        let command = build_import_command(&secret, MESSAGE, CliTool::Kubectl);

        assert!(command.starts_with("echo \"\" | base64 -d | kubectl create -f -"));
        assert!(command.contains("sleep 2 && echo \"\" | base64 -d | kubectl apply"));
    }

    #[test]
    fn test_missing_import_manifest_empties_apply_step_only() {
        let secret = secret_with("c1", "c1-import", &[("crds.yaml", "X")]);
        let command = build_import_command(&secret, MESSAGE, CliTool::Kubectl);

        let expected = format!(
            "echo \"{}\" | base64 -d | kubectl create -f - || test $? -eq 0 && sleep 2 && echo \"\" | base64 -d | kubectl apply -f - || echo \"{}\" | base64 -d",
            STANDARD.encode("X"),
            STANDARD.encode(MESSAGE)
        );
        assert_eq!(command, expected);
    }

    #[test]
    fn test_deterministic() {
        let secret = secret_with("c1", "c1-import", &[("crds.yaml", "a: 1\n"), ("import.yaml", "b: 2\n")]);
        assert_eq!(
            build_import_command(&secret, MESSAGE, CliTool::Kubectl),
            build_import_command(&secret, MESSAGE, CliTool::Kubectl)
        );
    }
}
