//! # Certcascade Testkit
//!
//! Testing utilities for certcascade.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: CA hierarchies in a memory store, ready to run
//! - **Generators**: Proptest strategies for random signing trees and faults
//!
//! ## Test Fixtures
//!
//! ```rust
//! use certcascade_testkit::fixtures::TreeFixture;
//!
//! let fixture = TreeFixture::chain(&["ca", "intermediate", "leaf"]);
//! assert_eq!(fixture.root, "ca");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use certcascade_testkit::generators::{block_on, tree_spec};
//!
//! proptest! {
//!     #[test]
//!     fn every_node_reported(spec in tree_spec(32, false)) {
//!         let report = block_on(spec.install().run());
//!         prop_assert_eq!(report.entries.len(), spec.node_count());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{ca_mid_leaf, two_leaves, CancelOnRegenerate, TreeFixture};
pub use generators::{block_on, tree_spec, tree_with_back_edge, TreeSpec};
