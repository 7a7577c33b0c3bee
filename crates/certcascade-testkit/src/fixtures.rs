//! Test fixtures and helpers.
//!
//! Common setup code for cascade scenarios.

use std::sync::Arc;

use async_trait::async_trait;
use certcascade_core::Report;
use certcascade_engine::{CancelHandle, CancelToken, CascadeEngine, EngineConfig};
use certcascade_store::{CredentialVersion, MemoryStore, StoreClient, StoreError};

/// A CA hierarchy held in a [`MemoryStore`].
pub struct TreeFixture {
    pub root: String,
    pub store: Arc<MemoryStore>,
}

impl TreeFixture {
    /// A hierarchy containing only `root`.
    pub fn new(root: &str) -> Self {
        let store = MemoryStore::new();
        store.add_certificate(root);
        Self {
            root: root.to_string(),
            store: Arc::new(store),
        }
    }

    /// A straight chain: each name signs the next.
    pub fn chain(names: &[&str]) -> Self {
        let fixture = Self::new(names.first().copied().unwrap_or("ca"));
        for pair in names.windows(2) {
            fixture.store.add_signed(pair[0], pair[1]);
        }
        fixture
    }

    /// A root signing `width` leaves named `leaf-0`, `leaf-1`, ...
    pub fn fanout(root: &str, width: usize) -> Self {
        let fixture = Self::new(root);
        for i in 0..width {
            fixture.store.add_signed(root, &format!("leaf-{}", i));
        }
        fixture
    }

    /// Add an edge `issuer` signs `name`.
    pub fn sign(&self, issuer: &str, name: &str) -> &Self {
        self.store.add_signed(issuer, name);
        self
    }

    pub fn engine(&self, config: EngineConfig) -> CascadeEngine<MemoryStore> {
        CascadeEngine::new(Arc::clone(&self.store), config)
            .expect("fixture engine config must be valid")
    }

    /// Run with the default configuration and no cancellation.
    pub async fn run(&self) -> Report {
        self.run_with(EngineConfig::default(), &CancelToken::never())
            .await
    }

    pub async fn run_with(&self, config: EngineConfig, cancel: &CancelToken) -> Report {
        self.engine(config)
            .run(&self.root, cancel)
            .await
            .expect("cascade run failed")
    }
}

/// `ca` signs `leaf1` and `leaf2`.
pub fn two_leaves() -> TreeFixture {
    let fixture = TreeFixture::new("ca");
    fixture.sign("ca", "leaf1").sign("ca", "leaf2");
    fixture
}

/// `ca` signs `mid`, which signs `leaf`.
pub fn ca_mid_leaf() -> TreeFixture {
    TreeFixture::chain(&["ca", "mid", "leaf"])
}

/// Wraps a store and requests cancellation when a given certificate is
/// regenerated, after the call has been issued.
pub struct CancelOnRegenerate<S> {
    inner: S,
    trigger: String,
    handle: CancelHandle,
}

impl<S> CancelOnRegenerate<S> {
    pub fn new(inner: S, trigger: &str, handle: CancelHandle) -> Self {
        Self {
            inner,
            trigger: trigger.to_string(),
            handle,
        }
    }
}

#[async_trait]
impl<S: StoreClient> StoreClient for CancelOnRegenerate<S> {
    async fn list_signed_by(&self, name: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_signed_by(name).await
    }

    async fn regenerate(&self, name: &str) -> Result<CredentialVersion, StoreError> {
        if name == self.trigger {
            self.handle.cancel();
        }
        self.inner.regenerate(name).await
    }
}
