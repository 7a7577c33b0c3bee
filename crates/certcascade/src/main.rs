use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use certcascade::cli::{BulkRegenerateArgs, Cli, Command};
use certcascade::interrupt::{escalate_interrupts, FORCED_EXIT_CODE};
use certcascade::store::HttpStore;
use certcascade::{bulk_regenerate, CancelHandle, CliConfig};

/// Exit code for configuration and usage errors.
const USAGE_ERROR: u8 = 2;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::BulkRegenerate(args) => run(args).await,
    }
}

async fn run(args: BulkRegenerateArgs) -> ExitCode {
    let config = match CliConfig::resolve(&args.supplied(), |name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {}", error);
            return ExitCode::from(USAGE_ERROR);
        }
    };

    init_tracing(config.verbose);

    let store = match HttpStore::new(config.store.clone()) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            eprintln!("error: {}", error);
            return ExitCode::from(USAGE_ERROR);
        }
    };

    match execute(store, &config).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

async fn execute(store: Arc<HttpStore>, config: &CliConfig) -> Result<ExitCode> {
    let cancel = CancelHandle::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if escalate_interrupts(on_interrupt, tokio::signal::ctrl_c).await {
            eprintln!("interrupted twice, exiting without waiting for in-flight work");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });

    let mut stdout = std::io::stdout().lock();
    let status = bulk_regenerate(store, config, &cancel, &mut stdout)
        .await
        .context("bulk-regenerate failed")?;

    Ok(ExitCode::from(status.exit_code() as u8))
}
