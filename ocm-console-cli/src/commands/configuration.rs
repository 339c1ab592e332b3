use crate::api::{segment, ApiClient};
use crate::output;
use anyhow::{Context, Result};
use ocm_console_common::ConfigurationFile;
use std::path::Path;

pub async fn handle_download(
    cluster: &str,
    kind: &str,
    file: Option<&Path>,
    api: &ApiClient,
) -> Result<()> {
    let path = format!(
        "/api/clusters/{}/configuration/{}",
        segment(cluster),
        segment(kind)
    );
    let configuration: ConfigurationFile = api.get(&path).await?;

    if configuration.content.is_empty() {
        output::print_warning(&format!("The {} of '{}' is empty", kind, cluster));
    }

    let target = file.unwrap_or_else(|| Path::new(&configuration.file_name));
    std::fs::write(target, &configuration.content)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    output::print_success(&format!("Saved {} to {}", kind, target.display()));
    Ok(())
}
