//! Cancellation signal handed to fetch functions
//!
//! The query client owns cancellation. It creates an [`AbortSignal`], passes
//! it along with the request, and fetch functions observe it. The kit itself
//! only forwards the signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{QueryError, QueryResult};

#[derive(Debug)]
struct SignalState {
    aborted: AtomicBool,
    notify: tokio::sync::Notify,
}

/// Shared cancellation flag with async notification.
///
/// Clones observe the same state.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    inner: Arc<SignalState>,
}

impl AbortSignal {
    /// Create a new, not yet aborted signal
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalState {
                aborted: AtomicBool::new(false),
                notify: tokio::sync::Notify::new(),
            }),
        }
    }

    /// Abort the signal and wake every waiter
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Check if aborted
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Return a `CANCELLED` error if the signal was aborted
    pub fn check(&self) -> QueryResult<()> {
        if self.is_aborted() {
            Err(QueryError::cancelled("Request was aborted"))
        } else {
            Ok(())
        }
    }

    /// Wait until aborted
    pub async fn aborted(&self) {
        let notified = self.inner.notify.notified();
        if self.is_aborted() {
            return;
        }
        notified.await;
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clones_share_state() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(clone.check().is_ok());
        signal.abort();
        assert!(clone.is_aborted());
        assert!(clone.check().unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_aborted_wakes_waiter() {
        let signal = AbortSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.aborted().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.abort();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_aborted_returns_immediately_when_already_aborted() {
        let signal = AbortSignal::new();
        signal.abort();
        tokio::time::timeout(Duration::from_millis(100), signal.aborted())
            .await
            .expect("already aborted signal should not wait");
    }
}
