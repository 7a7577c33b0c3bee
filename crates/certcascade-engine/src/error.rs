//! Error types for the engine.

use certcascade_core::CoreError;
use thiserror::Error;

/// Errors that stop a cascade run outright.
///
/// Store failures are not here: they are contained to the node that hit
/// them and show up in the report instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration rejected before any remote call.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker task panicked or was aborted.
    #[error("worker failed: {0}")]
    Worker(String),

    /// Graph or state bookkeeping error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
