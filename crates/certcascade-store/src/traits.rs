//! StoreClient trait: the two remote operations the cascade engine needs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A certificate version produced by a regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialVersion {
    /// Credential name the version belongs to.
    pub name: String,
    /// Store-assigned identifier of the new version.
    pub version_id: String,
    /// Creation timestamp as reported by the store, if any.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Authenticated handle to the remote credential store.
///
/// Implementations must be thread-safe: the engine issues calls for sibling
/// certificates concurrently.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// List the certificates directly signed by `name`, in store order.
    ///
    /// Read-only and idempotent. Pagination is handled by the implementation.
    async fn list_signed_by(&self, name: &str) -> Result<Vec<String>>;

    /// Regenerate the certificate `name`, rotating its key material.
    ///
    /// Not idempotent: each successful call creates a new version, so callers
    /// must never retry it blindly.
    async fn regenerate(&self, name: &str) -> Result<CredentialVersion>;
}

#[async_trait]
impl<T: StoreClient + ?Sized> StoreClient for std::sync::Arc<T> {
    async fn list_signed_by(&self, name: &str) -> Result<Vec<String>> {
        (**self).list_signed_by(name).await
    }

    async fn regenerate(&self, name: &str) -> Result<CredentialVersion> {
        (**self).regenerate(name).await
    }
}
