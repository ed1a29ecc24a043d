use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scout_keeper::{create_example_config, Keeper, ScoutConfig};

#[derive(Parser, Debug)]
#[command(name = "scout-keeper")]
#[command(about = "Discovers and tracks liquidity positions held on pool hooks")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "scout.toml")]
    config: String,

    /// Override the configured RPC URL
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Override the configured poll interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Write an example configuration to the config path and exit
    #[arg(long)]
    init: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scout_keeper={0},scout_sdk={0},scout_core={0}", args.log_level)));
    if args.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if args.init {
        create_example_config(&args.config)
            .with_context(|| format!("Failed to write example config to {}", args.config))?;
        info!("Wrote example configuration to {}", args.config);
        return Ok(());
    }

    let mut config = ScoutConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }
    config.validate().context("Invalid configuration after overrides")?;

    info!("Starting position scout keeper");
    info!("RPC URL: {}", config.rpc_url);
    info!(
        owners = config.owners.len(),
        pools = config.pools.len(),
        candidates_per_owner = config.candidate_space(),
        "Loaded configuration"
    );

    let keeper = Keeper::connect(config).await.context("Failed to initialize keeper")?;

    if args.once {
        let report = keeper.refresh_all().await;
        info!(
            published = report.published,
            stale = report.stale,
            coverage_gaps = report.coverage_gaps,
            "Single pass complete"
        );
        for owner in &keeper.config().owners {
            let positions = keeper.tracker().positions(owner.address);
            println!("{}", serde_json::to_string_pretty(&positions)?);
        }
        return Ok(());
    }

    keeper
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
