//! Retrying batch writer with a shared circuit breaker.
//!
//! Wraps a [`Destination`] and applies the write policy: transient failures
//! are retried with exponential backoff, non-transient ones drop the batch
//! immediately, and a run of consecutively dropped batches trips the breaker
//! and aborts the pipeline. All record accounting flows through here so every
//! batch is counted exactly once, as persisted or as dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{error, warn};

use schoolseed_config::shared::RetryConfig;

use crate::destination::Destination;
use crate::error::{ErrorKind, SeedError, SeedResult};
use crate::metrics::{
    PIPELINE_ID_LABEL, SEED_BATCHES_WRITTEN_TOTAL, SEED_BATCH_WRITE_ATTEMPTS_TOTAL,
    SEED_BATCH_WRITE_DURATION_SECONDS, SEED_BATCH_WRITE_FAILURES_TOTAL, TABLE_NAME_LABEL,
};
use crate::stats::PipelineStats;
use crate::types::Batch;

/// How a batch left the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The batch was written; all of its records count as persisted.
    Persisted,
    /// Retries were exhausted or the error was not retryable; all of the
    /// batch's records count as dropped.
    Dropped,
}

/// Destination wrapper applying retry, backoff and circuit breaking.
///
/// Clones share the breaker state, so failures observed by any worker count
/// toward the same threshold.
#[derive(Debug, Clone)]
pub struct RetryingWriter<D> {
    destination: D,
    retry: RetryConfig,
    max_consecutive_errors: u32,
    consecutive_errors: Arc<AtomicU32>,
    stats: Arc<PipelineStats>,
}

impl<D: Destination> RetryingWriter<D> {
    pub fn new(
        destination: D,
        retry: RetryConfig,
        max_consecutive_errors: u32,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            destination,
            retry,
            max_consecutive_errors,
            consecutive_errors: Arc::new(AtomicU32::new(0)),
            stats,
        }
    }

    /// Writes `batch`, retrying transient failures.
    ///
    /// Returns `Ok` for both persisted and dropped batches; a dropped batch
    /// is an accounted-for outcome, not an error. The only error returned is
    /// [`ErrorKind::CircuitBreakerOpen`], raised when this drop pushed the
    /// consecutive failure count to the configured threshold.
    pub async fn write(&self, batch: &Batch) -> SeedResult<WriteOutcome> {
        let started = Instant::now();

        for attempt in 1..=self.retry.max_attempts {
            self.emit_counter(SEED_BATCH_WRITE_ATTEMPTS_TOTAL, batch);

            match self.destination.write_batch(batch).await {
                Ok(_) => {
                    self.consecutive_errors.store(0, Ordering::Relaxed);
                    self.stats.record_persisted(batch.len() as u64);
                    self.emit_counter(SEED_BATCHES_WRITTEN_TOTAL, batch);
                    histogram!(
                        SEED_BATCH_WRITE_DURATION_SECONDS,
                        PIPELINE_ID_LABEL => self.stats.pipeline_id().to_string(),
                        TABLE_NAME_LABEL => batch.table().to_string()
                    )
                    .record(started.elapsed().as_secs_f64());

                    return Ok(WriteOutcome::Persisted);
                }
                Err(err) => {
                    self.emit_counter(SEED_BATCH_WRITE_FAILURES_TOTAL, batch);

                    if !err.kind().is_transient() {
                        error!(
                            table = %batch.table(),
                            records = batch.len(),
                            %err,
                            "batch write failed with a non-retryable error, dropping batch"
                        );
                        return self.drop_batch(batch);
                    }

                    if attempt == self.retry.max_attempts {
                        error!(
                            table = %batch.table(),
                            records = batch.len(),
                            attempts = attempt,
                            %err,
                            "batch write retries exhausted, dropping batch"
                        );
                        return self.drop_batch(batch);
                    }

                    let delay = backoff_delay(&self.retry, attempt);
                    warn!(
                        table = %batch.table(),
                        records = batch.len(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %err,
                        "batch write failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // `max_attempts` is validated to be at least 1, so the loop always
        // returns before falling through.
        unreachable!("retry loop exits via success or drop")
    }

    fn drop_batch(&self, batch: &Batch) -> SeedResult<WriteOutcome> {
        self.stats.record_dropped(batch.len() as u64);

        let failures = self.consecutive_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.max_consecutive_errors {
            return Err(SeedError::from((
                ErrorKind::CircuitBreakerOpen,
                "Destination circuit breaker tripped",
                format!("{failures} consecutive batches failed to persist"),
            )));
        }

        Ok(WriteOutcome::Dropped)
    }

    fn emit_counter(&self, name: &'static str, batch: &Batch) {
        counter!(
            name,
            PIPELINE_ID_LABEL => self.stats.pipeline_id().to_string(),
            TABLE_NAME_LABEL => batch.table().to_string()
        )
        .increment(1);
    }
}

/// Delay before retry number `attempt + 1`, growing exponentially from the
/// configured initial delay and capped at the configured maximum.
///
/// Deliberately jitter-free so that retry timing stays deterministic.
fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let factor = retry.backoff_factor.powi(attempt.saturating_sub(1) as i32);
    let delay_ms = (retry.initial_delay_ms as f64 * factor).round() as u64;
    Duration::from_millis(delay_ms.min(retry.max_delay_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn backoff_grows_exponentially() {
        let retry = retry();
        assert_eq!(backoff_delay(&retry, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(&retry, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&retry, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&retry, 4), Duration::from_millis(4000));
    }

    #[test]
    fn backoff_is_capped_at_max_delay() {
        let retry = retry();
        assert_eq!(backoff_delay(&retry, 10), Duration::from_millis(10_000));
    }
}
