//! The `bulk-regenerate` command, independent of process setup.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use certcascade_core::CommandStatus;
use certcascade_engine::{CancelHandle, CascadeEngine};
use certcascade_store::StoreClient;
use tracing::info;

use crate::config::CliConfig;
use crate::render::{render_plan, render_report};

/// Run the cascade (or the dry-run plan) and write the result to `out`.
///
/// Returns the command status; the caller turns it into an exit code.
pub async fn bulk_regenerate<S, W>(
    store: Arc<S>,
    config: &CliConfig,
    cancel: &CancelHandle,
    out: &mut W,
) -> Result<CommandStatus>
where
    S: StoreClient + ?Sized + 'static,
    W: Write,
{
    let engine = CascadeEngine::new(store, config.engine.clone())
        .context("invalid engine configuration")?;

    let timer = config.command_timeout.map(|timeout| cancel.cancel_after(timeout));
    let token = cancel.token();

    let result = if config.dry_run {
        let discovery = engine
            .plan(&config.root, &token)
            .await
            .with_context(|| format!("discovery below {} failed", config.root))?;
        let status = if discovery.is_complete() {
            CommandStatus::Success
        } else {
            CommandStatus::Failure
        };
        info!(root = config.root.as_str(), nodes = discovery.graph.len(), "dry run finished");
        (render_plan(&discovery, config.output)?, status)
    } else {
        let report = engine
            .run(&config.root, &token)
            .await
            .with_context(|| format!("cascade regeneration of {} failed", config.root))?;
        (render_report(&report, config.output)?, report.status)
    };

    if let Some(timer) = timer {
        timer.abort();
    }

    let (rendered, status) = result;
    out.write_all(rendered.as_bytes())
        .context("failed to write output")?;
    out.flush().context("failed to write output")?;
    Ok(status)
}
