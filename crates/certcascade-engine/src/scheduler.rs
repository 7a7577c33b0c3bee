//! Regeneration Scheduler: rotates the signer graph level by level.
//!
//! For each level, in order:
//!
//! 1. Nodes whose signer did not succeed inherit `SkippedParentFailed`
//!    (or `Cancelled`, if the signer was cancelled).
//! 2. If cancellation was requested, every still-pending node becomes
//!    `Cancelled` and the run ends.
//! 3. The certificates each node signs are listed (reads, retried). For the
//!    root this doubles as the existence check before any mutation.
//! 4. Remaining pending nodes are regenerated through a bounded pool.
//! 5. If the root did not succeed, nothing else is attempted.
//! 6. Listed children are attached as the next level.
//!
//! The next level never starts before every node of the current one is
//! terminal, so a certificate is only regenerated after its signer.

use std::sync::Arc;

use certcascade_core::{NodeIndex, Outcome, Report, SignerGraph};
use certcascade_store::{StoreClient, StoreError};
use tracing::{debug, info, warn};

use crate::aggregator::ResultAggregator;
use crate::builder::SignerGraphBuilder;
use crate::call::{regenerate_once, Listing};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::pool::run_bounded;

/// Drives discovery and regeneration for one cascade run.
pub struct RegenerationScheduler<S: ?Sized> {
    store: Arc<S>,
    config: EngineConfig,
    builder: SignerGraphBuilder<S>,
}

impl<S> RegenerationScheduler<S>
where
    S: StoreClient + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let builder = SignerGraphBuilder::new(Arc::clone(&store), config.clone());
        Self {
            store,
            config,
            builder,
        }
    }

    /// Run the cascade below `root` and report every discovered certificate.
    pub async fn run(&self, root: &str, cancel: &CancelToken) -> Result<Report> {
        let mut graph = SignerGraph::new(root);
        let mut results = ResultAggregator::new();
        results.track(&graph);

        let mut level = vec![NodeIndex::ROOT];
        let mut depth = 0usize;

        while !level.is_empty() {
            self.inherit_parent_outcomes(&graph, &level, &mut results)?;

            if cancel.is_cancelled() {
                warn!(depth, nodes = level.len(), "cancelled, abandoning remaining levels");
                for &index in &level {
                    if results.is_pending(index) {
                        results.record(index, Outcome::Cancelled)?;
                    }
                }
                break;
            }

            info!(depth, nodes = level.len(), "processing level");

            let discovered = self.discover_children(&graph, &level, &mut results, cancel).await?;
            self.regenerate_level(&graph, &level, &mut results, cancel).await?;

            if depth == 0 && results.outcome(NodeIndex::ROOT) != Some(Outcome::Succeeded) {
                warn!(
                    root,
                    outcome = ?results.outcome(NodeIndex::ROOT),
                    "root did not rotate, nothing below it will be attempted"
                );
                break;
            }

            let mut next = Vec::new();
            for (parent, names) in discovered {
                next.extend(self.builder.attach(&mut graph, parent, &names)?);
            }
            results.track(&graph);

            level = next;
            depth += 1;
        }

        let report = results.report(&graph);
        info!(
            root,
            succeeded = report.counts.succeeded,
            failed = report.counts.failed,
            skipped = report.counts.skipped,
            cancelled = report.counts.cancelled,
            status = ?report.status,
            "cascade finished"
        );
        Ok(report)
    }

    /// Resolve nodes whose signer ended unfavorably, without any remote call.
    fn inherit_parent_outcomes(
        &self,
        graph: &SignerGraph,
        level: &[NodeIndex],
        results: &mut ResultAggregator,
    ) -> Result<()> {
        for &index in level {
            let Some(parent) = graph.node(index)?.parent else {
                continue;
            };
            if let Some(inherited) = results
                .outcome(parent)
                .and_then(|outcome| outcome.inherited_by_child())
            {
                debug!(name = graph.name(index), outcome = %inherited, "inherited from signer");
                results.record(index, inherited)?;
            }
        }
        Ok(())
    }

    /// List what each level node signs.
    ///
    /// Skipped nodes are still listed so their descendants appear in the
    /// report. A pending node whose listing fails is marked failed and will
    /// not be regenerated: its children could not be rotated after it.
    async fn discover_children(
        &self,
        graph: &SignerGraph,
        level: &[NodeIndex],
        results: &mut ResultAggregator,
        cancel: &CancelToken,
    ) -> Result<Vec<(NodeIndex, Vec<String>)>> {
        let listable: Vec<NodeIndex> = level
            .iter()
            .copied()
            .filter(|&index| results.outcome(index) != Some(Outcome::Cancelled))
            .collect();

        let listings = self.builder.list_level(graph, &listable, cancel).await?;

        let mut discovered = Vec::new();
        for (index, listing) in listings {
            match listing {
                Listing::Children(names) => discovered.push((index, names)),
                Listing::Failed(error) => {
                    warn!(name = graph.name(index), %error, "could not list signed certificates");
                    if results.is_pending(index) {
                        results.record_with_detail(
                            index,
                            Outcome::Failed(error.reason()),
                            error.to_string(),
                        )?;
                    }
                }
                Listing::Cancelled => {
                    if results.is_pending(index) {
                        results.record(index, Outcome::Cancelled)?;
                    }
                }
            }
        }

        Ok(discovered)
    }

    /// Regenerate every still-pending node of the level, bounded by the worker limit.
    async fn regenerate_level(
        &self,
        graph: &SignerGraph,
        level: &[NodeIndex],
        results: &mut ResultAggregator,
        cancel: &CancelToken,
    ) -> Result<()> {
        let pending: Vec<NodeIndex> = level
            .iter()
            .copied()
            .filter(|&index| results.is_pending(index))
            .collect();

        let mut jobs = Vec::with_capacity(pending.len());
        for &index in &pending {
            results.begin(index)?;

            let store = Arc::clone(&self.store);
            let config = self.config.clone();
            let cancel = cancel.clone();
            let name = graph.name(index).to_string();

            jobs.push(async move {
                // Once issued, a regeneration runs to completion.
                if cancel.is_cancelled() {
                    return (Outcome::Cancelled, None);
                }
                match regenerate_once(store.as_ref(), &name, &config).await {
                    Ok(version) => {
                        info!(name = name.as_str(), version = version.version_id.as_str(), "regenerated");
                        (Outcome::Succeeded, None)
                    }
                    Err(error) => {
                        warn!(name = name.as_str(), %error, "regeneration failed");
                        (Outcome::Failed(error.reason()), Some(error.to_string()))
                    }
                }
            });
        }

        let outcomes = run_bounded(jobs, self.config.worker_limit).await?;
        for (index, joined) in pending.into_iter().zip(outcomes) {
            let (outcome, detail) = joined.unwrap_or_else(|panic| {
                let error = StoreError::Protocol(format!("regeneration panicked: {}", panic));
                warn!(name = graph.name(index), %error, "regeneration task failed");
                (Outcome::Failed(error.reason()), Some(error.to_string()))
            });
            match detail {
                Some(detail) => results.record_with_detail(index, outcome, detail)?,
                None => results.record(index, outcome)?,
            }
        }

        Ok(())
    }
}
