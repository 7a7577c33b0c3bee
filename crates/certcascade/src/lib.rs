//! # Certcascade
//!
//! Rotate a certificate authority and, in signing order, every certificate
//! it transitively signs.
//!
//! ## Overview
//!
//! A CA is regenerated first. Then each certificate it signs is
//! regenerated, then the certificates those sign, and so on, level by level.
//! A failure anywhere stops the rotation of that branch only: everything
//! below a failed certificate is reported as skipped, siblings continue.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use certcascade::engine::{CancelHandle, CascadeEngine, EngineConfig};
//! use certcascade::store::{HttpStore, HttpStoreConfig};
//!
//! async fn example() {
//!     let store = HttpStore::new(HttpStoreConfig {
//!         api_url: "https://credhub.example.com:8844".into(),
//!         token: Some("token".into()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     let engine = CascadeEngine::new(Arc::new(store), EngineConfig::default()).unwrap();
//!     let report = engine.run("my-ca", &CancelHandle::new().token()).await.unwrap();
//!     println!("{}", report);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `certcascade::core` - graph, outcomes and reports
//! - `certcascade::store` - the store contract and its implementations
//! - `certcascade::engine` - discovery, scheduling and aggregation

pub mod cli;
pub mod command;
pub mod config;
pub mod interrupt;
pub mod render;

// Re-export component crates
pub use certcascade_core as core;
pub use certcascade_engine as engine;
pub use certcascade_store as store;

pub use command::bulk_regenerate;
pub use config::{CliConfig, ConfigError, FlagBinding, OutputFormat, FLAG_TABLE};

pub use certcascade_core::{CommandStatus, Outcome, Report};
pub use certcascade_engine::{CancelHandle, CascadeEngine, EngineConfig};
