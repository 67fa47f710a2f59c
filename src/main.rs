//! Command-line interface for base-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Sync every table (connection settings from the environment)
//! base-sync sync
//!
//! # Only two tables, without writing anything
//! base-sync sync --tables users,orders --dry-run
//!
//! # Recreate all rows instead of matching existing records
//! base-sync sync --full
//!
//! # Machine-readable result map
//! base-sync sync --json
//! ```
//!
//! ## Environment
//! - `MYSQL_HOST`, `MYSQL_PORT`, `MYSQL_USERNAME`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`
//! - `APP_TOKEN`, `PERSONAL_BASE_TOKEN`, `REGION` (`domestic` | `overseas`), `BASE_API_URL`
//! - `GITHUB_ACTIONS` / `GITHUB_OUTPUT`: results are appended as `sync_results=<json>`

use base_client::BaseOpts;
use base_sync::{output, sync_all_tables, BaseArgs, MySqlArgs, SyncArgs};
use base_sync_mysql_source::SourceOpts;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "base-sync")]
#[command(about = "Mirror MySQL tables into Feishu / Lark Base tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync all source tables into the destination app
    Sync {
        #[command(flatten)]
        mysql: MySqlArgs,

        #[command(flatten)]
        base: BaseArgs,

        #[command(flatten)]
        sync: SyncArgs,

        /// Print the table -> success map as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            mysql,
            base,
            sync,
            json,
        } => {
            let source_opts = SourceOpts::from(&mysql);
            let base_opts = BaseOpts::from(&base);

            let report = sync_all_tables(&source_opts, &base_opts, (&sync).into()).await?;

            if json {
                println!("{}", output::results_json(&report)?);
            } else {
                print!("{}", output::summary(&report));
            }

            if std::env::var_os("GITHUB_ACTIONS").is_some() {
                match std::env::var_os("GITHUB_OUTPUT") {
                    Some(path) => {
                        output::write_github_output(&PathBuf::from(path), &report)?;
                        info!("Wrote sync results to GITHUB_OUTPUT");
                    }
                    None => println!("sync_results={}", output::results_json(&report)?),
                }
            }

            if !report.all_succeeded() {
                warn!(
                    "{} of {} tables failed",
                    report.len() - report.success_count(),
                    report.len()
                );
            }
        }
    }

    Ok(())
}
