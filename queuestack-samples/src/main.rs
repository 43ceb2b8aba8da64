//! queuestack-samples - queue storage walkthrough
//!
//! Runs the queue samples against a storage account. Settings come from
//! `queuestack.toml`, `QUEUESTACK_*` environment variables and the command
//! line, in increasing order of precedence.

use anyhow::Context;
use clap::Parser;
use queuestack_queue::InMemoryQueueService;
use queuestack_samples::{Config, SampleRunner, Suite};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "queuestack-samples")]
#[command(about = "Queue storage samples", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./queuestack.toml when present)
    #[arg(short, long, env = "QUEUESTACK_CONFIG")]
    config: Option<PathBuf>,

    /// Run against the local storage emulator
    #[arg(long, env = "QUEUESTACK_EMULATED")]
    emulated: Option<bool>,

    /// Storage account name
    #[arg(long, env = "QUEUESTACK_ACCOUNT_NAME")]
    account_name: Option<String>,

    /// Storage account key
    #[arg(long, env = "QUEUESTACK_ACCOUNT_KEY", hide_env_values = true)]
    account_key: Option<String>,

    /// Samples to run
    #[arg(long, value_enum, default_value = "all")]
    suite: Suite,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "QUEUESTACK_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "queuestack_samples={level},queuestack_queue={level}",
                    level = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(emulated) = args.emulated {
        config.account.emulated = emulated;
    }
    if let Some(name) = args.account_name {
        config.account.name = Some(name);
    }
    if let Some(key) = args.account_key {
        config.account.key = Some(key);
    }

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let account = config.account.storage_account()?;
    info!("Starting queue samples...");
    info!("  Account: {}", account.name);
    info!("  Endpoint: {}", account.queue_endpoint());
    info!(
        "  Mode: {}",
        if account.emulated { "emulator" } else { "live" }
    );

    let service = InMemoryQueueService::connect(&account)
        .with_context(|| format!("could not open queue service for account {}", account.name))?;

    let runner = SampleRunner::new(&service, config.samples, account.emulated);
    let outcomes = runner.run(args.suite).await;

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.succeeded())
        .map(|o| o.suite)
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("sample suites failed: {}", failed.join(", "));
    }

    info!("All samples completed");
    Ok(())
}
