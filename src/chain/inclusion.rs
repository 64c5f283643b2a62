/// Inclusion polling: wait until a broadcast transaction shows up on chain
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::chain::traits::TxQuery;
use crate::error::SendError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// Fixed-delay, bounded poller
///
/// Each failed lookup is followed by one `delay`, so the longest wait is
/// `max_attempts * delay`. There is no backoff growth and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionPoller {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for InclusionPoller {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl InclusionPoller {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Poll until `query` finds `hash` or the attempts run out
    pub async fn wait_for(&self, hash: &str, query: &dyn TxQuery) -> Result<Value, SendError> {
        self.run(hash, query, None).await
    }

    /// Same as `wait_for`, but stops early once `abort` holds `true`
    pub async fn wait_for_or_abort(
        &self,
        hash: &str,
        query: &dyn TxQuery,
        abort: watch::Receiver<bool>,
    ) -> Result<Value, SendError> {
        self.run(hash, query, Some(abort)).await
    }

    async fn run(
        &self,
        hash: &str,
        query: &dyn TxQuery,
        mut abort: Option<watch::Receiver<bool>>,
    ) -> Result<Value, SendError> {
        log::info!(
            "Waiting for inclusion of {} ({} attempts, {:?} apart)",
            hash,
            self.max_attempts,
            self.delay
        );

        for attempt in 1..=self.max_attempts {
            if abort.as_ref().map_or(false, |rx| *rx.borrow()) {
                return Err(SendError::InclusionAborted {
                    hash: hash.to_string(),
                    attempts: attempt - 1,
                });
            }

            match query.tx(hash).await {
                Ok(tx) => {
                    log::info!("Transaction {} included (attempt {})", hash, attempt);
                    return Ok(tx);
                }
                Err(e) => {
                    log::debug!(
                        "Transaction {} not found yet (attempt {}/{}): {}",
                        hash,
                        attempt,
                        self.max_attempts,
                        e
                    );
                }
            }

            if self.pause(&mut abort).await {
                log::info!("Stopped waiting for {} after {} attempts", hash, attempt);
                return Err(SendError::InclusionAborted {
                    hash: hash.to_string(),
                    attempts: attempt,
                });
            }
        }

        log::warn!(
            "Transaction {} not included after {} attempts",
            hash,
            self.max_attempts
        );
        Err(SendError::InclusionTimeout {
            hash: hash.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Sleep one delay; returns true if the abort flag was raised meanwhile
    async fn pause(&self, abort: &mut Option<watch::Receiver<bool>>) -> bool {
        let Some(rx) = abort else {
            sleep(self.delay).await;
            return false;
        };

        let deadline = sleep(self.delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return false,
                changed = rx.changed() => match changed {
                    Ok(()) => {
                        if *rx.borrow_and_update() {
                            return true;
                        }
                    }
                    // Sender gone, nobody can abort anymore
                    Err(_) => {
                        (&mut deadline).await;
                        return false;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Fails a fixed number of times, then finds the transaction
    struct FlakyQuery {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyQuery {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    /// The paused clock can round each sleep up to the next millisecond
    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed <= expected + Duration::from_millis(100),
            "elapsed {:?}, expected about {:?}",
            elapsed,
            expected
        );
    }

    #[async_trait]
    impl TxQuery for FlakyQuery {
        async fn tx(&self, hash: &str) -> anyhow::Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(anyhow!("tx ({}) not found", hash))
            } else {
                Ok(json!({"txhash": hash, "height": "100"}))
            }
        }
    }

    #[test]
    fn test_default_budget() {
        let poller = InclusionPoller::default();
        assert_eq!(poller.max_attempts, 30);
        assert_eq!(poller.delay, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_inclusion() {
        let query = FlakyQuery::new(0);
        let start = Instant::now();

        let tx = InclusionPoller::default().wait_for("ABC", &query).await.unwrap();

        assert_eq!(tx["txhash"], json!("ABC"));
        assert_eq!(query.calls(), 1);
        assert_elapsed(start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures() {
        let query = FlakyQuery::new(3);
        let start = Instant::now();

        InclusionPoller::default().wait_for("ABC", &query).await.unwrap();

        assert_eq!(query.calls(), 4);
        assert_elapsed(start, Duration::from_millis(3 * 2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_budget() {
        let query = FlakyQuery::new(u32::MAX);
        let start = Instant::now();

        let err = InclusionPoller::default().wait_for("ABC", &query).await.unwrap_err();

        assert!(matches!(err, SendError::InclusionTimeout { attempts: 30, .. }));
        assert_eq!(query.calls(), 30);
        assert_elapsed(start, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_equal_to_budget_time_out() {
        let poller = InclusionPoller::new(5, Duration::from_millis(100));
        let query = FlakyQuery::new(5);

        let err = poller.wait_for("ABC", &query).await.unwrap_err();

        assert!(matches!(err, SendError::InclusionTimeout { attempts: 5, .. }));
        assert_eq!(query.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_polls_are_independent() {
        let poller = InclusionPoller::new(2, Duration::from_millis(100));
        let query = FlakyQuery::new(3);

        assert!(poller.wait_for("ABC", &query).await.is_err());
        // Third failure, then success on the second attempt of this call
        assert!(poller.wait_for("ABC", &query).await.is_ok());
        assert_eq!(query.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_stops_polling() {
        let query = FlakyQuery::new(u32::MAX);
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            sleep(Duration::from_millis(5000)).await;
            let _ = tx.send(true);
        });

        let err = InclusionPoller::default()
            .wait_for_or_abort("ABC", &query, rx)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::InclusionAborted { attempts: 3, .. }));
        assert_eq!(query.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_aborted() {
        let query = FlakyQuery::new(0);
        let (_tx, rx) = watch::channel(true);

        let err = InclusionPoller::default()
            .wait_for_or_abort("ABC", &query, rx)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::InclusionAborted { attempts: 0, .. }));
        assert_eq!(query.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_abort_sender_keeps_default_behaviour() {
        let query = FlakyQuery::new(2);
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let start = Instant::now();

        InclusionPoller::default()
            .wait_for_or_abort("ABC", &query, rx)
            .await
            .unwrap();

        assert_eq!(query.calls(), 3);
        assert_elapsed(start, Duration::from_millis(4000));
    }
}
