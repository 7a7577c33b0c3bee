//! CascadeEngine: the entry point tying discovery, scheduling and reporting together.

use std::sync::Arc;

use certcascade_core::Report;
use certcascade_store::StoreClient;
use tracing::info;

use crate::builder::{Discovery, SignerGraphBuilder};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::scheduler::RegenerationScheduler;

/// Rotates a CA and everything it transitively signs.
///
/// Holds only the store handle and configuration; every run builds its
/// graph and outcome table from scratch.
pub struct CascadeEngine<S: ?Sized> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S> CascadeEngine<S>
where
    S: StoreClient + ?Sized + 'static,
{
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Regenerate `root` and every certificate it transitively signs.
    pub async fn run(&self, root: &str, cancel: &CancelToken) -> Result<Report> {
        info!(
            root,
            workers = self.config.worker_limit,
            max_depth = self.config.max_depth,
            "starting cascade regeneration"
        );
        RegenerationScheduler::new(Arc::clone(&self.store), self.config.clone())
            .run(root, cancel)
            .await
    }

    /// Discover what `run` would touch, without regenerating anything.
    pub async fn plan(&self, root: &str, cancel: &CancelToken) -> Result<Discovery> {
        SignerGraphBuilder::new(Arc::clone(&self.store), self.config.clone())
            .discover(root, cancel)
            .await
    }
}
