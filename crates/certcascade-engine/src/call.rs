//! Timed, and where safe retried, calls into the store.

use std::future::Future;
use std::time::Duration;

use certcascade_store::{CredentialVersion, StoreClient, StoreError};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::config::EngineConfig;

/// Result of listing the certificates one node signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Names returned by the store, in store order.
    Children(Vec<String>),
    /// The listing failed after any retries.
    Failed(StoreError),
    /// Cancellation was observed before the listing completed.
    Cancelled,
}

/// List `name`'s children, retrying transient failures with backoff.
pub(crate) async fn list_with_retry<S>(
    store: &S,
    name: &str,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Listing
where
    S: StoreClient + ?Sized,
{
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Listing::Cancelled;
        }

        debug!(name, attempt, "list_signed_by");
        match timed(config.request_timeout, name, store.list_signed_by(name)).await {
            Ok(children) => return Listing::Children(children),
            Err(error) if error.is_transient() && attempt < config.retry.max_attempts => {
                let delay = config.retry.backoff(attempt, rand::random());
                warn!(name, attempt, ?delay, %error, "listing failed, retrying");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Listing::Cancelled,
                }
                attempt += 1;
            }
            Err(error) => return Listing::Failed(error),
        }
    }
}

/// Regenerate `name` exactly once.
///
/// A timeout here is ambiguous: the store may still apply the rotation.
pub(crate) async fn regenerate_once<S>(
    store: &S,
    name: &str,
    config: &EngineConfig,
) -> Result<CredentialVersion, StoreError>
where
    S: StoreClient + ?Sized,
{
    debug!(name, "regenerate");
    timed(config.request_timeout, name, store.regenerate(name)).await
}

async fn timed<T, F>(timeout: Duration, name: &str, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(format!("{} after {:?}", name, timeout))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelHandle;
    use crate::config::RetryPolicy;
    use certcascade_store::MemoryStore;

    fn fast_config(max_attempts: u32) -> EngineConfig {
        EngineConfig {
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_retries_transient() {
        let store = MemoryStore::new();
        store.add_signed("ca", "leaf");
        store.fail_list_times("ca", StoreError::Network("reset".into()), 2);

        let listing = list_with_retry(&store, "ca", &fast_config(3), &CancelToken::never()).await;
        assert_eq!(listing, Listing::Children(vec!["leaf".into()]));
        assert_eq!(store.list_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_list_gives_up_after_max_attempts() {
        let store = MemoryStore::new();
        store.add_certificate("ca");
        store.fail_list("ca", StoreError::Timeout("slow".into()));

        let listing = list_with_retry(&store, "ca", &fast_config(3), &CancelToken::never()).await;
        assert_eq!(listing, Listing::Failed(StoreError::Timeout("slow".into())));
        assert_eq!(store.list_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_list_does_not_retry_permanent() {
        let store = MemoryStore::new();
        store.fail_list("ca", StoreError::PermissionDenied("ca".into()));

        let listing = list_with_retry(&store, "ca", &fast_config(5), &CancelToken::never()).await;
        assert_eq!(listing, Listing::Failed(StoreError::PermissionDenied("ca".into())));
        assert_eq!(store.list_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_list_cancelled_before_call() {
        let store = MemoryStore::new();
        store.add_certificate("ca");
        let handle = CancelHandle::new();
        handle.cancel();

        let listing = list_with_retry(&store, "ca", &fast_config(3), &handle.token()).await;
        assert_eq!(listing, Listing::Cancelled);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_regenerate_never_retried() {
        let store = MemoryStore::new();
        store.add_certificate("ca");
        store.fail_regenerate_times("ca", StoreError::Network("reset".into()), 1);

        let result = regenerate_once(&store, "ca", &fast_config(5)).await;
        assert_eq!(result.unwrap_err(), StoreError::Network("reset".into()));
        assert_eq!(store.regenerate_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let store = MemoryStore::new();
        store.add_certificate("ca");
        store.set_latency(Duration::from_secs(60));

        let config = EngineConfig {
            request_timeout: Duration::from_secs(1),
            ..fast_config(1)
        };
        let result = regenerate_once(&store, "ca", &config).await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }
}
