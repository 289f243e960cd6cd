//! # Call Guards
//!
//! Deadlines and cancellation for store calls.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  guard.run("save", op)                                                  │
//! │       │                                                                 │
//! │       ├── token cancelled?  ──► drop op ──► StoreError::Cancelled       │
//! │       ├── deadline passed?  ──► drop op ──► StoreError::Timeout         │
//! │       └── op finished       ──► its result                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping the in-flight operation drops its pooled connection, which goes
//! back to the pool (or is closed if it was mid-statement).

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Deadline and cancellation token applied to every call of a store.
#[derive(Debug, Clone, Default)]
pub struct CallGuard {
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl CallGuard {
    /// A guard that never aborts.
    pub fn none() -> Self {
        CallGuard::default()
    }

    /// Sets an absolute deadline shared by every call made through the guard.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a per-call timeout, measured from the start of each call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the token that aborts in-flight calls when cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The earliest of the absolute deadline and `now + timeout`.
    fn effective_deadline(&self) -> Option<Instant> {
        let relative = self.timeout.map(|t| Instant::now() + t);
        match (self.deadline, relative) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs `op`, aborting it if the token fires or the deadline passes.
    ///
    /// Cancellation is checked before the deadline, and both are checked
    /// before `op` is first polled, so an already-cancelled token or an
    /// already-expired deadline never starts a query.
    pub async fn run<T, F>(&self, operation: &'static str, op: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let deadline = self.effective_deadline();

        // A fresh Sleep is never ready on first poll, so an expired deadline
        // has to be caught here or `op` would run to completion.
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            debug!(operation, "Store call cancelled before start");
            return Err(StoreError::Cancelled { operation });
        }
        if deadline.is_some_and(|at| at <= Instant::now()) {
            debug!(operation, "Store call deadline already passed");
            return Err(StoreError::Timeout { operation });
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                debug!(operation, "Store call cancelled");
                Err(StoreError::Cancelled { operation })
            }
            _ = expired => {
                debug!(operation, "Store call timed out");
                Err(StoreError::Timeout { operation })
            }
            result = op => result,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unguarded_call_completes() {
        let guard = CallGuard::none();
        let value = guard.run("count", async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts() {
        let token = CancellationToken::new();
        token.cancel();
        let guard = CallGuard::none().cancellation(token);

        let result: StoreResult<()> = guard.run("save", async { Ok(()) }).await;
        assert!(matches!(result, Err(StoreError::Cancelled { operation: "save" })));
    }

    #[tokio::test]
    async fn test_past_deadline_aborts() {
        let guard = CallGuard::none().deadline(Instant::now());

        let result: StoreResult<()> = guard
            .run("find_all", std::future::pending::<StoreResult<()>>())
            .await;
        assert!(matches!(result, Err(StoreError::Timeout { operation: "find_all" })));
    }

    #[tokio::test]
    async fn test_past_deadline_never_runs_ready_op() {
        let guard = CallGuard::none().deadline(Instant::now());
        let ran = std::sync::atomic::AtomicBool::new(false);

        let result = guard
            .run("save", async {
                ran.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(StoreError::Timeout { operation: "save" })));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancelled_token_never_runs_ready_op() {
        let token = CancellationToken::new();
        token.cancel();
        let guard = CallGuard::none()
            .cancellation(token)
            .deadline(Instant::now());
        let ran = std::sync::atomic::AtomicBool::new(false);

        let result = guard
            .run("count", async {
                ran.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(0)
            })
            .await;

        // Cancellation wins over an expired deadline
        assert!(matches!(result, Err(StoreError::Cancelled { operation: "count" })));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_timeout_aborts_slow_call() {
        let guard = CallGuard::none().timeout(Duration::from_millis(10));

        let result = guard
            .run("count", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            })
            .await;
        assert!(matches!(result, Err(StoreError::Timeout { .. })));
    }

    #[test]
    fn test_effective_deadline_takes_earliest() {
        let soon = Instant::now() + Duration::from_millis(5);
        let guard = CallGuard::none()
            .deadline(soon)
            .timeout(Duration::from_secs(60));
        assert_eq!(guard.effective_deadline(), Some(soon));
        assert_eq!(CallGuard::none().effective_deadline(), None);
    }
}
