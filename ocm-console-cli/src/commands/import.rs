use crate::api::{segment, ApiClient};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use ocm_console_common::{CliTool, ImportCommandResponse, ImportCommandStatus};
use std::time::Duration;

pub async fn handle_import_command(
    cluster: &str,
    oc: bool,
    api: &ApiClient,
    format: OutputFormat,
) -> Result<()> {
    let tool = CliTool::from_oc_flag(oc);
    let path = format!(
        "/api/clusters/{}/import-command?tool={}",
        segment(cluster),
        tool.binary()
    );

    // The server may poll for the import secret for several seconds
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Waiting for the import secret of '{}'...", cluster));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result: Result<ImportCommandResponse> = api.get(&path).await;
    spinner.finish_and_clear();
    let response = result?;

    match format {
        OutputFormat::Json => output::print_json(&response)?,
        OutputFormat::Yaml => output::print_yaml(&response)?,
        OutputFormat::Table => print_response(&response),
    }

    Ok(())
}

fn print_response(response: &ImportCommandResponse) {
    match (&response.status, &response.command) {
        (ImportCommandStatus::Ready, Some(command)) => {
            if response.pending_import {
                output::print_info(&format!(
                    "Run this command on '{}' to import it:",
                    response.cluster
                ));
            }
            println!("{}", command);
        }
        (ImportCommandStatus::AutoImport, _) => {
            output::print_warning(response.message.as_deref().unwrap_or("Cluster is auto-imported"))
        }
        _ => output::print_info(
            response
                .message
                .as_deref()
                .unwrap_or("No import command is available for this cluster"),
        ),
    }
}
