//! Interrupt handling: the first interrupt cancels, the second forces exit.

use std::future::Future;

use certcascade_engine::CancelHandle;
use tracing::warn;

/// Exit code used when the user interrupts twice.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Cancel `cancel` on the first interrupt, then wait for a second one.
///
/// `next_interrupt` resolves once per interrupt, as `tokio::signal::ctrl_c`
/// does. Returns `true` when a second interrupt arrived and `false` if
/// listening failed, in which case the caller must not force an exit.
pub async fn escalate_interrupts<F, Fut>(cancel: CancelHandle, mut next_interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(error) = next_interrupt().await {
        warn!(%error, "cannot listen for interrupts");
        return false;
    }
    warn!("interrupted, finishing in-flight regenerations (interrupt again to quit)");
    cancel.cancel();

    match next_interrupt().await {
        Ok(()) => true,
        Err(error) => {
            warn!(%error, "cannot listen for interrupts");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    fn gated(gate: &Arc<Semaphore>) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>> {
        let gate = Arc::clone(gate);
        move || {
            let gate = Arc::clone(&gate);
            Box::pin(async move {
                gate.acquire_owned()
                    .await
                    .map(|permit| permit.forget())
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            })
        }
    }

    #[tokio::test]
    async fn test_second_interrupt_forces_exit() {
        let gate = Arc::new(Semaphore::new(0));
        let cancel = CancelHandle::new();
        let token = cancel.token();

        let task = tokio::spawn(escalate_interrupts(cancel.clone(), gated(&gate)));

        gate.add_permits(1);
        token.cancelled().await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!task.is_finished());

        gate.add_permits(1);
        assert!(task.await.unwrap());
    }

    #[tokio::test]
    async fn test_listener_failure_never_forces_exit() {
        let cancel = CancelHandle::new();
        let failing = || async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signals")) };

        assert!(!escalate_interrupts(cancel.clone(), failing).await);
        assert!(!cancel.is_cancelled());
    }
}
