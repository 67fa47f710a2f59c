//! base-sync library
//!
//! Mirrors the tables of a MySQL database into Feishu / Lark Base (Bitable)
//! tables. Runs are repeatable: rows are matched to destination records by
//! primary key (or by content when a table has none), so a second run
//! updates what the first one created instead of duplicating it.
//!
//! # Crates
//!
//! - `sync_core` - field kinds, row values, identity keys, run reports
//! - `mysql_types` - MySQL type mapping and value conversion
//! - `base_sink` / `base_client` - destination contract and its HTTP client
//! - `base_sync_mysql_source` - MySQL table source
//! - `reconcile` - schema sync, record index, batch writes, the engine
//!
//! # CLI Usage
//!
//! ```bash
//! export MYSQL_HOST=127.0.0.1 MYSQL_USERNAME=reader MYSQL_PASSWORD=... MYSQL_DATABASE=shop
//! export APP_TOKEN=... PERSONAL_BASE_TOKEN=... REGION=domestic
//! base-sync sync
//! base-sync sync --tables users,orders --dry-run
//! ```

use base_client::{BaseOpts, BitableClient, Region};
use base_sync_mysql_source::{MySqlSource, SourceOpts};
use clap::Args;
use reconcile::{Pacing, ReconciliationEngine, SyncError, SyncOpts};
use std::time::Duration;
use sync_core::SyncReport;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub mod config;
pub mod output;

use config::{duration_arg, non_empty};

/// MySQL connection options
#[derive(Args, Clone, Debug)]
pub struct MySqlArgs {
    #[arg(long, env = "MYSQL_HOST", value_parser = non_empty)]
    pub mysql_host: String,

    #[arg(long, env = "MYSQL_PORT", default_value_t = 3306)]
    pub mysql_port: u16,

    #[arg(long, env = "MYSQL_USERNAME", value_parser = non_empty)]
    pub mysql_username: String,

    #[arg(long, env = "MYSQL_PASSWORD", value_parser = non_empty, hide_env_values = true)]
    pub mysql_password: String,

    /// Database whose tables are synchronized
    #[arg(long, env = "MYSQL_DATABASE", value_parser = non_empty)]
    pub mysql_database: String,
}

impl From<&MySqlArgs> for SourceOpts {
    fn from(args: &MySqlArgs) -> Self {
        Self {
            host: args.mysql_host.clone(),
            port: args.mysql_port,
            username: args.mysql_username.clone(),
            password: args.mysql_password.clone(),
            database: args.mysql_database.clone(),
        }
    }
}

/// Destination options
#[derive(Args, Clone, Debug)]
pub struct BaseArgs {
    /// App token of the base the tables are written to
    #[arg(long, env = "APP_TOKEN", value_parser = non_empty)]
    pub app_token: String,

    /// Personal base token
    #[arg(long, env = "PERSONAL_BASE_TOKEN", value_parser = non_empty, hide_env_values = true)]
    pub personal_base_token: String,

    /// domestic (Feishu) or overseas (Lark)
    #[arg(long, env = "REGION", default_value = "domestic")]
    pub region: Region,

    /// Override the API base URL (proxies, testing)
    #[arg(long, env = "BASE_API_URL")]
    pub base_api_url: Option<String>,

    /// Per-request timeout
    #[arg(long, default_value = "30s", value_parser = duration_arg)]
    pub request_timeout: Duration,
}

impl From<&BaseArgs> for BaseOpts {
    fn from(args: &BaseArgs) -> Self {
        Self {
            app_token: args.app_token.clone(),
            personal_base_token: args.personal_base_token.clone(),
            region: args.region,
            api_url: args
                .base_api_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            timeout: args.request_timeout,
        }
    }
}

/// Sync options
#[derive(Args, Clone, Debug)]
pub struct SyncArgs {
    /// Create every row instead of matching existing records
    #[arg(long)]
    pub full: bool,

    /// Classify rows and log the writes without sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip rows whose content equals the matching destination record
    #[arg(long)]
    pub skip_unchanged: bool,

    /// Only sync these tables (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub tables: Option<Vec<String>>,

    /// Source rows read per page
    #[arg(long, default_value_t = reconcile::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Delay after each page of existing records
    #[arg(long, default_value = "200ms", value_parser = duration_arg)]
    pub index_page_delay: Duration,

    /// Delay after each batch write
    #[arg(long, default_value = "500ms", value_parser = duration_arg)]
    pub batch_delay: Duration,

    /// Delay after each source page
    #[arg(long, default_value = "500ms", value_parser = duration_arg)]
    pub source_page_delay: Duration,
}

impl From<&SyncArgs> for SyncOpts {
    fn from(args: &SyncArgs) -> Self {
        Self {
            incremental: !args.full,
            dry_run: args.dry_run,
            skip_unchanged: args.skip_unchanged,
            tables: args.tables.clone(),
            page_size: args.page_size,
            pacing: Pacing {
                index_page_delay: args.index_page_delay,
                batch_delay: args.batch_delay,
                source_page_delay: args.source_page_delay,
            },
        }
    }
}

/// Sync every table of the source database into the destination app.
///
/// Returns a connection error, before any table is touched, when either
/// side cannot be reached. Table failures are reported in the result.
pub async fn sync_all_tables(
    source_opts: &SourceOpts,
    base_opts: &BaseOpts,
    sync_opts: SyncOpts,
) -> Result<SyncReport, SyncError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("sync_run", run_id = %run_id);

    async move {
        info!(
            "Starting sync from MySQL {} to {} app {}",
            source_opts.display_target(),
            base_opts.region.display_name(),
            base_opts.app_token
        );
        if sync_opts.dry_run {
            info!("Dry run: no destination writes will be made");
        }

        let source = MySqlSource::connect(source_opts)
            .await
            .map_err(|e| SyncError::Connection(format!("{e:#}")))?;
        let sink = BitableClient::new(base_opts)
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        let mut engine = ReconciliationEngine::new(source, sink, sync_opts);
        let report = engine.run().await;

        let (source, _) = engine.into_parts();
        if let Err(e) = source.disconnect().await {
            warn!("Failed to close MySQL connection cleanly: {e:#}");
        }

        report
    }
    .instrument(span)
    .await
}
