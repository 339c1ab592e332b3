use crate::api::{segment, ApiClient};
use crate::output::{self, OutputFormat};
use crate::BmaCommands;
use anyhow::Result;
use dialoguer::Confirm;
use ocm_console_common::rbac::TableActionAccess;
use ocm_console_common::{BareMetalAssetRow, DeleteOutcome, DeleteRequest, ResourceRef};
use serde::Serialize;
use tabled::Tabled;

/// Table view of a listed asset; serializes like the server's row
#[derive(Debug, Serialize, Tabled)]
struct AssetRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(skip)]
    uid: Option<String>,
    #[tabled(rename = "CLUSTER")]
    cluster: String,
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(skip)]
    status_key: String,
    #[tabled(rename = "STATUS", display_with = "or_dash")]
    status: String,
}

impl From<BareMetalAssetRow> for AssetRow {
    fn from(row: BareMetalAssetRow) -> Self {
        Self {
            name: row.name,
            namespace: row.namespace,
            uid: row.uid,
            cluster: row.cluster,
            role: row.role,
            status_key: row.status_key,
            status: row.status,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct ActionRow {
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "ALLOWED", display_with = "allowed_cell")]
    allowed: bool,
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn allowed_cell(allowed: &bool) -> String {
    output::yes_no(*allowed)
}

pub async fn handle_bma_command(
    command: BmaCommands,
    api: &ApiClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        BmaCommands::List => {
            let rows: Vec<BareMetalAssetRow> = api.get("/api/bare-metal-assets").await?;
            output::print_output(rows.into_iter().map(AssetRow::from).collect::<Vec<_>>(), format)?;
        }
        BmaCommands::Delete { resources, yes } => {
            if !yes && !confirm_delete(&resources)? {
                output::print_info("Deletion cancelled");
                return Ok(());
            }
            delete_assets(resources, api).await?;
        }
        BmaCommands::Actions { namespace, name } => {
            let path = format!(
                "/api/bare-metal-assets/{}/{}/actions",
                segment(&namespace),
                segment(&name)
            );
            let access: TableActionAccess = api.get(&path).await?;
            let rows: Vec<ActionRow> = access
                .0
                .iter()
                .map(|(action, allowed)| ActionRow {
                    action: action.to_string(),
                    allowed: *allowed,
                })
                .collect();
            output::print_output(rows, format)?;
        }
    }

    Ok(())
}

fn confirm_delete(resources: &[ResourceRef]) -> Result<bool> {
    let prompt = match resources {
        [single] => format!("Are you sure you want to delete bare metal asset {}?", single),
        many => format!("Are you sure you want to delete {} bare metal assets?", many.len()),
    };
    Ok(Confirm::new().with_prompt(prompt).interact()?)
}

async fn delete_assets(resources: Vec<ResourceRef>, api: &ApiClient) -> Result<()> {
    if let [single] = resources.as_slice() {
        let path = format!(
            "/api/bare-metal-assets/{}/{}",
            segment(&single.namespace),
            segment(&single.name)
        );
        api.delete(&path).await?;
        output::print_success(&format!("Bare metal asset '{}' deleted", single));
        return Ok(());
    }

    let outcomes: Vec<DeleteOutcome> = api
        .post("/api/bare-metal-assets/delete", &DeleteRequest { resources })
        .await?;

    let mut failed = 0;
    for outcome in &outcomes {
        if outcome.deleted {
            output::print_success(&format!("Bare metal asset '{}' deleted", outcome.resource));
        } else {
            failed += 1;
            output::print_error(&format!(
                "Failed to delete '{}': {}",
                outcome.resource,
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} deletions failed", failed, outcomes.len());
    }
    Ok(())
}
