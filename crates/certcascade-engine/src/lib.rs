//! # Certcascade Engine
//!
//! Cascade regeneration: rotate a CA, then, in dependency order, every
//! certificate it transitively signs.
//!
//! ## Overview
//!
//! - [`SignerGraphBuilder`] discovers the signed-by tree breadth-first,
//!   rejecting cycles and over-deep branches.
//! - [`RegenerationScheduler`] regenerates level by level through a bounded
//!   worker pool, skipping every subtree whose signer failed.
//! - [`ResultAggregator`] records outcomes and produces the ordered
//!   [`Report`](certcascade_core::Report).
//! - [`CascadeEngine`] wires them to a [`StoreClient`](certcascade_store::StoreClient).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use certcascade_engine::{CancelHandle, CascadeEngine, EngineConfig};
//! use certcascade_store::MemoryStore;
//!
//! async fn example() {
//!     let store = Arc::new(MemoryStore::new());
//!     store.add_signed("ca", "leaf");
//!
//!     let engine = CascadeEngine::new(store, EngineConfig::default()).unwrap();
//!     let cancel = CancelHandle::new();
//!     let report = engine.run("ca", &cancel.token()).await.unwrap();
//!     print!("{}", report);
//! }
//! ```
//!
//! ## Guarantees
//!
//! - A certificate is regenerated only if every certificate above it on its
//!   signing path was regenerated successfully.
//! - Levels are separated by a barrier; siblings run concurrently in no
//!   particular order.
//! - `list_signed_by` is retried on transient errors; `regenerate` never is.
//! - There is no cross-certificate atomicity: ordering, not all-or-nothing.

pub mod aggregator;
pub mod builder;
mod call;
pub mod cancel;
pub mod cascade;
pub mod config;
pub mod error;
mod pool;
pub mod scheduler;

pub use aggregator::ResultAggregator;
pub use builder::{Discovery, SignerGraphBuilder};
pub use call::Listing;
pub use cancel::{CancelHandle, CancelToken};
pub use cascade::CascadeEngine;
pub use config::{EngineConfig, RetryPolicy, MAX_RETRY_ATTEMPTS, MAX_WORKER_LIMIT};
pub use error::{EngineError, Result};
pub use scheduler::RegenerationScheduler;
