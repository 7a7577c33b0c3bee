//! # Certcascade Store
//!
//! The boundary between the cascade engine and the remote credential store.
//! The engine depends only on the [`StoreClient`] trait; transport,
//! authentication and serialization live behind it.
//!
//! ## Key Types
//!
//! - [`StoreClient`] - The async trait the engine consumes
//! - [`HttpStore`] - REST adapter for a CredHub-compatible API
//! - [`MemoryStore`] - In-memory CA hierarchy with fault injection, for tests
//! - [`CredentialVersion`] - What a successful regeneration returns
//! - [`StoreError`] - Failure taxonomy shared by all implementations
//!
//! ## Usage
//!
//! ```rust,no_run
//! use certcascade_store::{MemoryStore, StoreClient};
//!
//! async fn example() {
//!     let store = MemoryStore::new();
//!     store.add_certificate("ca");
//!     store.add_signed("ca", "leaf");
//!
//!     let children = store.list_signed_by("ca").await.unwrap();
//!     assert_eq!(children, vec!["leaf".to_string()]);
//!
//!     let version = store.regenerate("leaf").await.unwrap();
//!     println!("new version: {}", version.version_id);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Reads are idempotent**: `list_signed_by` may be retried by callers.
//! - **Writes are not**: every successful `regenerate` rotates key material,
//!   so implementations never retry it internally.

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use http::{HttpStore, HttpStoreConfig};
pub use memory::{MemoryStore, StoreCall};
pub use traits::{CredentialVersion, StoreClient};
