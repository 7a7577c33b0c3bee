//! Signer Graph Builder: breadth-first discovery of everything a CA signs.
//!
//! Discovery is queue-driven, one level at a time, and never recursive.
//! Cycle and depth checks are explicit steps of inserting an edge (see
//! [`SignerGraph::insert_child`]), so a misbehaving server yields failed
//! entries instead of unbounded work.

use std::sync::Arc;

use certcascade_core::{Insertion, NodeIndex, SignerGraph};
use certcascade_store::{StoreClient, StoreError};
use tracing::{debug, info, warn};

use crate::call::{list_with_retry, Listing};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::pool::run_bounded;

/// Output of a full, mutation-free discovery.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// The discovered tree, including rejected edges.
    pub graph: SignerGraph,
    /// Nodes whose children could not be listed.
    pub failures: Vec<(NodeIndex, StoreError)>,
    /// Nodes not listed because cancellation was requested.
    pub cancelled: Vec<NodeIndex>,
}

impl Discovery {
    /// The error that prevented listing the root, if any.
    pub fn root_error(&self) -> Option<&StoreError> {
        self.failures
            .iter()
            .find(|(index, _)| index.is_root())
            .map(|(_, error)| error)
    }

    /// True if every discovered node was listed and no edge was rejected.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty() && self.graph.rejected_count() == 0
    }
}

/// Discovers the signed-by graph through a [`StoreClient`].
pub struct SignerGraphBuilder<S: ?Sized> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S> SignerGraphBuilder<S>
where
    S: StoreClient + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// List the children of every node in `parents`, concurrently.
    ///
    /// At most `worker_limit` listings are in flight. Results come back in
    /// the same order as `parents`.
    pub async fn list_level(
        &self,
        graph: &SignerGraph,
        parents: &[NodeIndex],
        cancel: &CancelToken,
    ) -> Result<Vec<(NodeIndex, Listing)>> {
        let jobs: Vec<_> = parents
            .iter()
            .map(|&parent| {
                let store = Arc::clone(&self.store);
                let config = self.config.clone();
                let cancel = cancel.clone();
                let name = graph.name(parent).to_string();
                async move { list_with_retry(store.as_ref(), &name, &config, &cancel).await }
            })
            .collect();

        let listings = run_bounded(jobs, self.config.worker_limit).await?;
        Ok(parents
            .iter()
            .copied()
            .zip(listings)
            .map(|(parent, listing)| {
                let listing = listing.unwrap_or_else(|panic| {
                    Listing::Failed(StoreError::Protocol(format!("listing panicked: {}", panic)))
                });
                (parent, listing)
            })
            .collect())
    }

    /// Insert `parent`'s listed children into the graph, in listed order.
    ///
    /// Returns the indices of newly inserted nodes. Rejected edges are
    /// recorded in the graph as failed discovery entries; names already
    /// placed elsewhere are dropped.
    pub fn attach(
        &self,
        graph: &mut SignerGraph,
        parent: NodeIndex,
        names: &[String],
    ) -> Result<Vec<NodeIndex>> {
        let mut inserted = Vec::new();

        for name in names {
            match graph.insert_child(parent, name, self.config.max_depth)? {
                Insertion::Inserted(index) => inserted.push(index),
                Insertion::Duplicate(existing) => {
                    let first_signer = graph
                        .node(existing)?
                        .parent
                        .map(|p| graph.name(p).to_string());
                    debug!(
                        name = name.as_str(),
                        signer = graph.name(parent),
                        ?first_signer,
                        "certificate already discovered, keeping first discovery"
                    );
                }
                Insertion::Rejected(reason) => {
                    warn!(
                        name = name.as_str(),
                        signer = graph.name(parent),
                        %reason,
                        "rejected signing edge"
                    );
                }
            }
        }

        Ok(inserted)
    }

    /// Discover the complete graph below `root` without mutating anything.
    pub async fn discover(&self, root: &str, cancel: &CancelToken) -> Result<Discovery> {
        let mut graph = SignerGraph::new(root);
        let mut failures = Vec::new();
        let mut cancelled = Vec::new();
        let mut level = vec![NodeIndex::ROOT];
        let mut depth = 0usize;

        while !level.is_empty() {
            debug!(depth, nodes = level.len(), "discovering level");
            let listings = self.list_level(&graph, &level, cancel).await?;

            let mut next = Vec::new();
            for (index, listing) in listings {
                match listing {
                    Listing::Children(names) => {
                        next.extend(self.attach(&mut graph, index, &names)?);
                    }
                    Listing::Failed(error) => {
                        warn!(name = graph.name(index), %error, "could not list signed certificates");
                        failures.push((index, error));
                    }
                    Listing::Cancelled => cancelled.push(index),
                }
            }

            level = next;
            depth += 1;
        }

        info!(
            root,
            nodes = graph.len(),
            rejected = graph.rejected_count(),
            failures = failures.len(),
            "discovery finished"
        );

        Ok(Discovery {
            graph,
            failures,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certcascade_core::{DiscoveryEntry, FailureReason};
    use certcascade_store::MemoryStore;

    fn builder(store: &Arc<MemoryStore>, max_depth: usize) -> SignerGraphBuilder<MemoryStore> {
        let config = EngineConfig {
            max_depth,
            ..Default::default()
        };
        SignerGraphBuilder::new(Arc::clone(store), config)
    }

    fn names(graph: &SignerGraph) -> Vec<String> {
        graph.nodes().map(|(_, node)| node.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_discover_breadth_first() {
        let store = Arc::new(MemoryStore::new());
        store.add_signed("ca", "int1");
        store.add_signed("ca", "int2");
        store.add_signed("int1", "leaf1");
        store.add_signed("int2", "leaf2");

        let discovery = builder(&store, 8)
            .discover("ca", &CancelToken::never())
            .await
            .unwrap();

        assert!(discovery.is_complete());
        assert_eq!(names(&discovery.graph), vec!["ca", "int1", "int2", "leaf1", "leaf2"]);
        assert!(store.regenerate_calls().is_empty());
    }

    #[tokio::test]
    async fn test_discover_cycle() {
        let store = Arc::new(MemoryStore::new());
        store.add_signed("ca", "a");
        store.add_signed("a", "b");
        store.add_signed("b", "a");

        let discovery = builder(&store, 8)
            .discover("ca", &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(names(&discovery.graph), vec!["ca", "a", "b"]);
        let b = discovery.graph.index_of("b").unwrap();
        assert_eq!(
            discovery.graph.entries().last(),
            Some(&DiscoveryEntry::Rejected {
                name: "a".into(),
                parent: b,
                reason: FailureReason::CycleDetected,
            })
        );
        // "a" was listed once, never a second time below b.
        assert_eq!(store.list_calls(), vec!["ca", "a", "b"]);
    }

    #[tokio::test]
    async fn test_discover_depth_bound() {
        let store = Arc::new(MemoryStore::new());
        store.add_signed("ca", "d1");
        store.add_signed("d1", "d2");
        store.add_signed("d2", "d3");
        store.add_signed("ca", "sibling");

        let discovery = builder(&store, 2)
            .discover("ca", &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(names(&discovery.graph), vec!["ca", "d1", "sibling", "d2"]);
        assert_eq!(discovery.graph.rejected_count(), 1);
        assert!(!discovery.is_complete());
        assert!(!store.list_calls().contains(&"d3".to_string()));
    }

    #[tokio::test]
    async fn test_discover_missing_root() {
        let store = Arc::new(MemoryStore::new());

        let discovery = builder(&store, 8)
            .discover("nope", &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(discovery.graph.len(), 1);
        assert_eq!(
            discovery.root_error(),
            Some(&StoreError::NotFound("nope".into()))
        );
    }

    #[tokio::test]
    async fn test_attach_drops_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let builder = builder(&store, 8);
        let mut graph = SignerGraph::new("ca");

        let first = builder
            .attach(&mut graph, NodeIndex::ROOT, &["a".into(), "b".into(), "a".into()])
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(graph.len(), 3);
    }
}
