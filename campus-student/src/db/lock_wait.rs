//! Waiting out the SQLite writer lock
//!
//! One writer at a time. A burst of enrollments or payment-lock requests can
//! outlast the per-connection `busy_timeout`; those writes are re-run within
//! the `db_max_lock_wait_ms` budget. Pauses start at 1/64 of the budget and
//! double up to a quarter of it, so a small budget retries quickly and a
//! large one does not hammer the database.

use campus_common::Result;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Budget for re-running a write that hit the writer lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockWait {
    budget: Duration,
}

impl LockWait {
    pub fn new(max_wait_ms: u64) -> Self {
        Self {
            budget: Duration::from_millis(max_wait_ms),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Pause before re-run number `retry` (zero-based)
    fn pause(&self, retry: u32) -> Duration {
        let first = (self.budget / 64).max(Duration::from_millis(1));
        let longest = (self.budget / 4).max(first);
        first.saturating_mul(1u32 << retry.min(16)).min(longest)
    }

    /// Run `write`, re-running it while it fails on lock contention
    ///
    /// Any other error is returned at once. When the budget runs out the
    /// last contention error is returned unchanged.
    pub async fn write<T, F, Fut>(&self, what: &'static str, mut write: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut retries = 0u32;

        loop {
            let contention = match write().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(
                            what,
                            retries,
                            waited_ms = started.elapsed().as_millis() as u64,
                            "Write went through after waiting for the writer lock"
                        );
                    }
                    return Ok(value);
                }
                Err(err) if err.is_lock_contention() => err,
                Err(err) => return Err(err),
            };

            let pause = self.pause(retries);
            if started.elapsed() + pause > self.budget {
                warn!(
                    what,
                    retries,
                    budget_ms = self.budget.as_millis() as u64,
                    "Gave up waiting for the writer lock"
                );
                return Err(contention);
            }

            retries += 1;
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_common::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked() -> Error {
        Error::Database(sqlx::Error::Protocol("database is locked".to_string()))
    }

    #[test]
    fn test_pauses_scale_with_budget() {
        let wait = LockWait::new(6400);
        assert_eq!(wait.pause(0), Duration::from_millis(100));
        assert_eq!(wait.pause(1), Duration::from_millis(200));
        assert_eq!(wait.pause(3), Duration::from_millis(800));
        assert_eq!(wait.pause(4), Duration::from_millis(1600));
        assert_eq!(wait.pause(30), Duration::from_millis(1600));

        // Tiny budgets still pause at least a millisecond
        assert_eq!(LockWait::new(10).pause(0), Duration::from_millis(1));
        assert_eq!(LockWait::new(0).pause(5), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_contention_is_waited_out() {
        let calls = AtomicU32::new(0);
        let result = LockWait::new(640)
            .write("test write", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Err(locked())
                    } else {
                        Ok("written")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "written");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_contention_error() {
        let result = LockWait::new(20)
            .write("test write", || async { Err::<(), _>(locked()) })
            .await;

        assert!(result.unwrap_err().is_lock_contention());
    }

    #[tokio::test]
    async fn test_other_errors_are_not_rerun() {
        let calls = AtomicU32::new(0);
        let result = LockWait::new(5000)
            .write("test write", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::InvalidInput("bad row".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
