//! # Certcascade Core
//!
//! Pure data model for cascading certificate rotation: the signer graph,
//! per-node outcomes, and the final report.
//!
//! This crate contains no I/O, no networking, no async. It is plain
//! bookkeeping over certificate names and the relationships the engine
//! discovers between them.
//!
//! ## Key Types
//!
//! - [`SignerGraph`] - Arena of [`CertificateNode`]s rooted at a CA, addressed by [`NodeIndex`]
//! - [`Outcome`] - Terminal result of one certificate's regeneration attempt
//! - [`NodeState`] - Per-node state machine (`Pending → Regenerating → terminal`)
//! - [`Report`] - Ordered outcomes plus aggregate counts and overall status
//!
//! ## Graph Invariants
//!
//! - A certificate name appears at most once; first discovery wins.
//! - The graph is acyclic by construction. A child already present on the
//!   root-to-parent path is rejected, never inserted.
//! - Rejected entries have no descendants.

pub mod error;
pub mod graph;
pub mod outcome;
pub mod report;
pub mod types;

pub use error::{CoreError, Result};
pub use graph::{DiscoveryEntry, Insertion, SignerGraph};
pub use outcome::{FailureReason, NodeState, Outcome};
pub use report::{CommandStatus, OutcomeCounts, Report, ReportEntry};
pub use types::{CertificateNode, NodeIndex};
