//! In-memory implementation of the StoreClient trait.
//!
//! This is primarily for testing. It models a CA hierarchy as a map from
//! issuer to the certificates it signs, and lets tests inject failures,
//! latency and inspect every call that was made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;

use crate::error::{Result, StoreError};
use crate::traits::{CredentialVersion, StoreClient};

/// A call observed by the memory store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListSignedBy(String),
    Regenerate(String),
}

/// In-memory credential store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct MemoryStoreInner {
    /// Certificates by name, with their current version number.
    certificates: HashMap<String, u64>,

    /// Issuer -> certificates it signs, in insertion order.
    signs: HashMap<String, Vec<String>>,

    /// Injected failures for `list_signed_by`.
    list_faults: HashMap<String, Fault>,

    /// Injected failures for `regenerate`.
    regenerate_faults: HashMap<String, Fault>,

    /// Call log.
    calls: Vec<StoreCall>,

    /// Artificial delay applied to every call.
    latency: Duration,
}

struct Fault {
    error: StoreError,
    /// `None` fails forever; `Some(n)` fails the next `n` calls.
    remaining: Option<u32>,
}

impl Fault {
    /// Consume one firing of the fault, returning the error if it fires.
    fn fire(&mut self) -> Option<StoreError> {
        match &mut self.remaining {
            None => Some(self.error.clone()),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(self.error.clone())
            }
        }
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                certificates: HashMap::new(),
                signs: HashMap::new(),
                list_faults: HashMap::new(),
                regenerate_faults: HashMap::new(),
                calls: Vec::new(),
                latency: Duration::ZERO,
            }),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Register a certificate with no signing relationships.
    pub fn add_certificate(&self, name: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.certificates.entry(name.to_string()).or_insert(1);
    }

    /// Record that `issuer` signs `name`, registering both certificates.
    ///
    /// Edges are not validated, so cycles and shared children can be modeled.
    pub fn add_signed(&self, issuer: &str, name: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.certificates.entry(issuer.to_string()).or_insert(1);
        inner.certificates.entry(name.to_string()).or_insert(1);
        inner
            .signs
            .entry(issuer.to_string())
            .or_default()
            .push(name.to_string());
    }

    /// Remove a certificate so later calls for it return `NotFound`.
    ///
    /// Signing edges pointing at it are kept, like a dangling reference
    /// returned by a server.
    pub fn remove_certificate(&self, name: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.certificates.remove(name);
    }

    /// Make every `list_signed_by(name)` fail with `error`.
    pub fn fail_list(&self, name: &str, error: StoreError) {
        let mut inner = self.inner.write().unwrap();
        inner.list_faults.insert(
            name.to_string(),
            Fault {
                error,
                remaining: None,
            },
        );
    }

    /// Make the next `times` calls to `list_signed_by(name)` fail with `error`.
    pub fn fail_list_times(&self, name: &str, error: StoreError, times: u32) {
        let mut inner = self.inner.write().unwrap();
        inner.list_faults.insert(
            name.to_string(),
            Fault {
                error,
                remaining: Some(times),
            },
        );
    }

    /// Make every `regenerate(name)` fail with `error`.
    pub fn fail_regenerate(&self, name: &str, error: StoreError) {
        let mut inner = self.inner.write().unwrap();
        inner.regenerate_faults.insert(
            name.to_string(),
            Fault {
                error,
                remaining: None,
            },
        );
    }

    /// Make the next `times` calls to `regenerate(name)` fail with `error`.
    pub fn fail_regenerate_times(&self, name: &str, error: StoreError, times: u32) {
        let mut inner = self.inner.write().unwrap();
        inner.regenerate_faults.insert(
            name.to_string(),
            Fault {
                error,
                remaining: Some(times),
            },
        );
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let mut inner = self.inner.write().unwrap();
        inner.latency = latency;
    }

    /// All calls made so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        let inner = self.inner.read().unwrap();
        inner.calls.clone()
    }

    /// Names passed to `regenerate`, in arrival order.
    pub fn regenerate_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Regenerate(name) => Some(name),
                StoreCall::ListSignedBy(_) => None,
            })
            .collect()
    }

    /// Names passed to `list_signed_by`, in arrival order.
    pub fn list_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::ListSignedBy(name) => Some(name),
                StoreCall::Regenerate(_) => None,
            })
            .collect()
    }

    /// Current version number of a certificate (1 until first regenerated).
    pub fn version(&self, name: &str) -> Option<u64> {
        let inner = self.inner.read().unwrap();
        inner.certificates.get(name).copied()
    }

    /// Highest number of `regenerate` calls observed in flight at once.
    pub fn max_concurrent_regenerations(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Record a call and return the configured latency.
    fn begin_call(&self, call: StoreCall) -> Duration {
        let mut inner = self.inner.write().unwrap();
        inner.calls.push(call);
        inner.latency
    }

    async fn regenerate_inner(&self, name: &str, latency: Duration) -> Result<CredentialVersion> {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.inner.write().unwrap();

        if let Some(error) = inner
            .regenerate_faults
            .get_mut(name)
            .and_then(Fault::fire)
        {
            return Err(error);
        }

        let version = inner
            .certificates
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        *version += 1;

        Ok(CredentialVersion {
            name: name.to_string(),
            version_id: version_id(name, *version),
            created_at: None,
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn list_signed_by(&self, name: &str) -> Result<Vec<String>> {
        let latency = self.begin_call(StoreCall::ListSignedBy(name.to_string()));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.inner.write().unwrap();

        if let Some(error) = inner.list_faults.get_mut(name).and_then(Fault::fire) {
            return Err(error);
        }

        if !inner.certificates.contains_key(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }

        Ok(inner.signs.get(name).cloned().unwrap_or_default())
    }

    async fn regenerate(&self, name: &str) -> Result<CredentialVersion> {
        let latency = self.begin_call(StoreCall::Regenerate(name.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.regenerate_inner(name, latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Derive a fresh version identifier: Blake3(name || version || salt), hex.
fn version_id(name: &str, version: u64) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = blake3::Hasher::new();
    hasher.update(b"certcascade-version-v0:");
    hasher.update(name.as_bytes());
    hasher.update(&version.to_be_bytes());
    hasher.update(&salt);
    hex::encode(&hasher.finalize().as_bytes()[..16])
}
