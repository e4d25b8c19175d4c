mod check;
mod collect;
mod history;
mod schedule;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rankwatch_core::{AppConfig, RankCheckConfig};
use rankwatch_search::ShoppingSearchClient;
use rankwatch_tracker::{BudgetAllocator, DailyCollector, PgStore, RankChecker, RetryPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rankwatch")]
#[command(about = "Search rank tracking under a shared daily API budget")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect today's ranks for every active product
    Collect {
        /// Restrict collection to one product (by external id)
        #[arg(long)]
        product: Option<String>,

        /// Probe and report without writing rank history or a run record
        #[arg(long)]
        dry_run: bool,
    },
    /// Probe one keyword for one product and print the result
    Check {
        #[arg(long)]
        keyword: String,

        /// External id of the product to look for
        #[arg(long)]
        product: String,
    },
    /// Show stored rank history for a product and keyword
    History {
        #[arg(long)]
        product: String,

        #[arg(long)]
        keyword: String,

        /// Number of most recent observations to show
        #[arg(long, default_value_t = 30)]
        limit: i64,
    },
    /// Run the daily collection on the configured cron schedule until interrupted
    Schedule,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; run `rankwatch --help` for usage");
        return Ok(());
    };

    let config = rankwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = rankwatch_db::connect(&config).await?;

    match command {
        Commands::Collect { product, dry_run } => {
            collect::run_collect(&pool, &config, product.as_deref(), dry_run).await?;
        }
        Commands::Check { keyword, product } => {
            check::run_check(&pool, &config, &keyword, &product).await?;
        }
        Commands::History {
            product,
            keyword,
            limit,
        } => history::run_history(&pool, &config, &product, &keyword, limit).await?,
        Commands::Schedule => schedule::run_schedule(pool, Arc::new(config)).await?,
    }

    Ok(())
}

/// Builds the search client from config, attaching credentials when both
/// halves are configured.
pub(crate) fn build_search_client(config: &AppConfig) -> anyhow::Result<ShoppingSearchClient> {
    let client = ShoppingSearchClient::with_base_url(
        &config.search_base_url,
        config.search_timeout_secs,
        config.search_min_interval_ms,
    )?;

    match (&config.search_client_id, &config.search_client_secret) {
        (Some(id), Some(secret)) => Ok(client.with_credentials(id, secret)),
        (None, None) => {
            tracing::warn!("search API credentials are not configured; requests may be rejected");
            Ok(client)
        }
        _ => anyhow::bail!(
            "RANKWATCH_SEARCH_CLIENT_ID and RANKWATCH_SEARCH_CLIENT_SECRET must be set together"
        ),
    }
}

pub(crate) fn build_checker(
    store: &Arc<PgStore>,
    config: &AppConfig,
    budget: Arc<BudgetAllocator>,
) -> anyhow::Result<RankChecker> {
    let client = Arc::new(build_search_client(config)?);
    let errors: Arc<dyn rankwatch_tracker::ErrorSink> = store.clone();

    Ok(RankChecker::new(client, budget, errors)
        .with_retry_policy(RetryPolicy::from(config))
        .with_keyword_delay(Duration::from_millis(config.keyword_delay_ms)))
}

pub(crate) fn build_collector(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    budget: Arc<BudgetAllocator>,
) -> anyhow::Result<DailyCollector> {
    let store = Arc::new(PgStore::new(pool.clone()));
    let checker = build_checker(&store, config, budget)?;
    Ok(DailyCollector::new(
        checker,
        store,
        RankCheckConfig::from(config),
    ))
}

pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = rankwatch_db::fail_collection_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark rankings run as failed"
        );
    }
}
