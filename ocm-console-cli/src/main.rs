//! OCM console CLI
//!
//! Command-line client for the OCM console API

mod api;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ocm_console_common::ResourceRef;

#[derive(Parser)]
#[command(name = "ocm-console", author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address (defaults to the configured server)
    #[arg(short, long)]
    server: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long)]
    output: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the command that imports a cluster into the hub
    ImportCommand {
        /// Managed cluster name
        cluster: String,
        /// Render the command for `oc` instead of `kubectl`
        #[arg(long)]
        oc: bool,
    },
    /// Manage bare metal assets
    Bma {
        #[command(subcommand)]
        command: BmaCommands,
    },
    /// Check whether an action is allowed on the hub
    CanI {
        /// Verb, e.g. get, create, delete
        verb: String,
        /// Resource plural, e.g. secrets
        resource: String,
        /// API group of the resource
        #[arg(long, default_value = "")]
        group: String,
        #[arg(short, long)]
        namespace: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Download a hive cluster's install-config or kubeconfig
    DownloadConfig {
        /// Managed cluster name
        cluster: String,
        #[arg(value_enum)]
        kind: ConfigKindArg,
        /// Write to this file instead of `<cluster>-<kind>.yaml`
        #[arg(short, long)]
        file: Option<std::path::PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum BmaCommands {
    /// List bare metal assets
    List,
    /// Delete bare metal assets
    Delete {
        /// Assets as <namespace>/<name>
        #[arg(required = true)]
        resources: Vec<ResourceRef>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show which row actions are allowed on an asset
    Actions { namespace: String, name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigKindArg {
    InstallConfig,
    Kubeconfig,
}

impl ConfigKindArg {
    fn path_segment(&self) -> &'static str {
        match self {
            Self::InstallConfig => "install-config",
            Self::Kubeconfig => "kubeconfig",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = config::Config::load().unwrap_or_default();
    let server = cli.server.as_deref().unwrap_or(&config.default_server);
    let format = output::OutputFormat::from_str(
        cli.output.as_deref().unwrap_or(&config.default_output),
    );

    let api_client = api::ApiClient::new(server, config.token.clone());

    match cli.command {
        Commands::ImportCommand { cluster, oc } => {
            commands::import::handle_import_command(&cluster, oc, &api_client, format).await?
        }
        Commands::Bma { command } => {
            commands::bma::handle_bma_command(command, &api_client, format).await?
        }
        Commands::CanI {
            verb,
            resource,
            group,
            namespace,
            name,
        } => {
            let check = commands::access::AccessCheck {
                group,
                resource,
                verb,
                namespace,
                name,
            };
            commands::access::handle_can_i(check, &api_client, format).await?
        }
        Commands::DownloadConfig { cluster, kind, file } => {
            commands::configuration::handle_download(
                &cluster,
                kind.path_segment(),
                file.as_deref(),
                &api_client,
            )
            .await?
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
