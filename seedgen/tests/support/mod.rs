//! Shared helpers for pipeline integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use schoolseed_config::shared::{BatchConfig, PipelineConfig, RetryConfig};
use seedgen::destination::{Destination, MemoryDestination};
use seedgen::error::{ErrorKind, SeedError, SeedResult};
use seedgen::types::{Batch, FieldValue, Record, TableName};
use uuid::Uuid;

/// A pipeline configuration tuned for fast tests: two workers, short batch
/// fill window, short retry delays.
pub fn test_pipeline_config(id: u64) -> PipelineConfig {
    PipelineConfig {
        id,
        queue_capacity: 1_000,
        worker_count: Some(2),
        batch: BatchConfig {
            max_size: 50,
            max_fill_ms: 50,
        },
        write_retry: RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_factor: 2.0,
        },
        max_consecutive_errors: 10,
        shutdown_timeout_ms: 5_000,
        progress_interval_ms: 500,
        caches: Default::default(),
        memory: Default::default(),
    }
}

pub fn test_record(table: &TableName) -> Record {
    Record::new(
        table.clone(),
        vec![
            ("student_uuid", FieldValue::Uuid(Uuid::new_v4())),
            ("full_name", FieldValue::Text("Test Student".to_owned())),
        ],
    )
}

/// How a [`FlakyDestination`] treats incoming writes.
#[derive(Debug, Clone, Copy)]
pub enum FailureMode {
    /// Fail the first `n` write attempts, then behave normally.
    FailFirst(u32),
    /// Fail every write attempt.
    AlwaysFail,
}

/// A destination that injects transient write failures in front of a
/// [`MemoryDestination`].
#[derive(Debug, Clone)]
pub struct FlakyDestination {
    inner: MemoryDestination,
    mode: FailureMode,
    attempts: Arc<AtomicU32>,
}

impl FlakyDestination {
    pub fn new(mode: FailureMode) -> Self {
        Self {
            inner: MemoryDestination::new(),
            mode,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn inner(&self) -> &MemoryDestination {
        &self.inner
    }

    /// Total write attempts observed, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Destination for FlakyDestination {
    fn name() -> &'static str {
        "flaky-memory"
    }

    async fn write_batch(&self, batch: &Batch) -> SeedResult<u64> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;

        let fail = match self.mode {
            FailureMode::FailFirst(n) => attempt <= n,
            FailureMode::AlwaysFail => true,
        };
        if fail {
            return Err(SeedError::from((
                ErrorKind::DestinationQueryFailed,
                "Injected write failure",
                format!("attempt {attempt}"),
            )));
        }

        self.inner.write_batch(batch).await
    }
}

/// A destination that remembers the table and size of every batch handed to
/// it before delegating to a [`MemoryDestination`].
#[derive(Debug, Clone, Default)]
pub struct RecordingDestination {
    inner: MemoryDestination,
    batches: Arc<Mutex<Vec<(TableName, usize)>>>,
}

impl RecordingDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// The batches seen so far, in write order.
    pub fn batches(&self) -> Vec<(TableName, usize)> {
        self.batches.lock().unwrap().clone()
    }
}

impl Destination for RecordingDestination {
    fn name() -> &'static str {
        "recording-memory"
    }

    async fn write_batch(&self, batch: &Batch) -> SeedResult<u64> {
        self.batches
            .lock()
            .unwrap()
            .push((batch.table().clone(), batch.len()));
        self.inner.write_batch(batch).await
    }
}

/// A destination whose writes block the worker thread for a fixed delay
/// before completing, so an in-progress write always runs to the end even
/// when the task is aborted.
#[derive(Debug, Clone)]
pub struct BlockingDestination {
    inner: MemoryDestination,
    delay: Duration,
}

impl BlockingDestination {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryDestination::new(),
            delay,
        }
    }
}

impl Destination for BlockingDestination {
    fn name() -> &'static str {
        "blocking-memory"
    }

    async fn write_batch(&self, batch: &Batch) -> SeedResult<u64> {
        std::thread::sleep(self.delay);
        self.inner.write_batch(batch).await
    }
}

/// A destination whose writes never complete, for shutdown timeout tests.
#[derive(Debug, Clone, Default)]
pub struct HangingDestination;

impl Destination for HangingDestination {
    fn name() -> &'static str {
        "hanging"
    }

    async fn write_batch(&self, _batch: &Batch) -> SeedResult<u64> {
        std::future::pending::<()>().await;
        Ok(0)
    }
}
