//! The ingestion pipeline: queue, worker pool, monitor and lifecycle.
//!
//! A [`Pipeline`] owns everything needed to move generated records into a
//! destination: the bounded ingestion queue producers write to, the batch
//! assembler workers that drain it, the retrying writer with its circuit
//! breaker, and the progress monitor. Its lifecycle is `Running` while
//! producers enqueue, `Draining` once shutdown begins or a fatal error is
//! signaled, and `Terminated` when all workers have exited.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use schoolseed_config::shared::PipelineConfig;

use crate::bail;
use crate::concurrency::shutdown::{PhaseRx, PhaseTx, create_phase_channel};
use crate::concurrency::signal::{SignalRx, SignalTx, create_signal};
use crate::destination::Destination;
use crate::error::{ErrorKind, SeedResult};
use crate::profile::ResourceProfile;
use crate::queue::IngestionQueue;
use crate::stats::{PipelineStats, StatsSnapshot};
use crate::workers::{AssemblerPool, BatchAssemblerWorker};
use crate::writer::RetryingWriter;

/// Producer handle for enqueuing records into a running pipeline.
///
/// Cheap to clone; any number of producer tasks can feed the same pipeline.
#[derive(Debug, Clone)]
pub struct RecordProducer {
    queue: IngestionQueue,
    stats: Arc<PipelineStats>,
}

impl RecordProducer {
    /// Enqueues one record, waiting when the queue is full.
    ///
    /// Fails with [`ErrorKind::QueueClosed`] once the pipeline has begun
    /// draining; the record is not counted and not stored.
    pub async fn enqueue(&self, record: crate::types::Record) -> SeedResult<()> {
        // Counted before the put so a consumer persisting the record cannot
        // decrement `in_flight` below zero in the window before the producer
        // catches up.
        self.stats.record_enqueued(1);
        if let Err(err) = self.queue.put(record).await {
            self.stats.revert_enqueued(1);
            return Err(err);
        }

        Ok(())
    }
}

/// A concurrent batched ingestion pipeline writing to destination `D`.
pub struct Pipeline<D> {
    config: PipelineConfig,
    destination: D,
    worker_count: usize,
    queue: IngestionQueue,
    stats: Arc<PipelineStats>,
    phase_tx: PhaseTx,
    phase_rx: PhaseRx,
    fatal_tx: SignalTx,
    fatal_rx: SignalRx,
    pool: Option<AssemblerPool>,
    monitor: Option<JoinHandle<()>>,
}

impl<D> Pipeline<D>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    /// Builds a pipeline from its configuration and the host profile.
    ///
    /// The worker count comes from the configuration when set, otherwise
    /// from the profile's sizing formula.
    pub fn new(config: PipelineConfig, profile: &ResourceProfile, destination: D) -> Self {
        let worker_count = config.worker_count.unwrap_or_else(|| profile.worker_count());
        let queue = IngestionQueue::new(config.queue_capacity);
        let stats = PipelineStats::new(config.id);
        let (phase_tx, phase_rx) = create_phase_channel();
        let (fatal_tx, fatal_rx) = create_signal();

        Self {
            config,
            destination,
            worker_count,
            queue,
            stats,
            phase_tx,
            phase_rx,
            fatal_tx,
            fatal_rx,
            pool: None,
            monitor: None,
        }
    }

    pub fn id(&self) -> crate::types::PipelineId {
        self.config.id
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Returns a producer handle for this pipeline.
    pub fn producer(&self) -> RecordProducer {
        RecordProducer {
            queue: self.queue.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Spawns the worker pool and the progress monitor.
    pub async fn start(&mut self) -> SeedResult<()> {
        if self.pool.is_some() {
            bail!(
                ErrorKind::ConfigError,
                "Pipeline already started",
                "start must be called at most once per pipeline"
            );
        }

        info!(
            pipeline_id = self.config.id,
            workers = self.worker_count,
            queue_capacity = self.queue.capacity(),
            batch_max_size = self.config.batch.max_size,
            "starting ingestion pipeline"
        );

        let writer = RetryingWriter::new(
            self.destination.clone(),
            self.config.write_retry.clone(),
            self.config.max_consecutive_errors,
            self.stats.clone(),
        );

        let mut pool = AssemblerPool::new();
        for worker_id in 0..self.worker_count {
            let worker = BatchAssemblerWorker::new(
                worker_id,
                self.queue.clone(),
                writer.clone(),
                self.config.batch.clone(),
                self.fatal_tx.clone(),
            );
            pool.spawn(worker_id, worker.run());
        }
        self.pool = Some(pool);

        self.monitor = Some(crate::monitor::spawn_progress_monitor(
            self.stats.clone(),
            self.config.progress_interval(),
            self.config.memory.clone(),
            self.phase_rx.clone(),
        ));

        // Any worker hitting a fatal error signals here; the pipeline then
        // stops producers and lets the surviving workers drain.
        let mut fatal_rx = self.fatal_rx.clone();
        let phase_tx = self.phase_tx.clone();
        let queue = self.queue.clone();
        tokio::spawn(async move {
            if fatal_rx.changed().await.is_ok() {
                warn!("fatal pipeline error signaled, draining");
                phase_tx.begin_drain();
                queue.close().await;
            }
        });

        Ok(())
    }

    /// Drains and terminates the pipeline, consuming it.
    ///
    /// Producers are cut off immediately; workers get up to the configured
    /// shutdown timeout to flush what remains. If the timeout elapses the
    /// remaining workers are aborted and their in-flight records are counted
    /// as dropped, so the final accounting still balances.
    ///
    /// Returns the final stats snapshot on a clean drain.
    pub async fn shutdown_and_wait(mut self) -> SeedResult<StatsSnapshot> {
        let Some(mut pool) = self.pool.take() else {
            bail!(
                ErrorKind::ConfigError,
                "Pipeline not started",
                "shutdown_and_wait requires a prior call to start"
            );
        };

        info!(pipeline_id = self.config.id, "draining ingestion pipeline");
        self.phase_tx.begin_drain();
        self.queue.close().await;

        let drained =
            tokio::time::timeout(self.config.shutdown_timeout(), pool.wait_all()).await;

        let result = match drained {
            Ok(worker_result) => worker_result.map(|_| self.stats.snapshot()),
            Err(_) => {
                // Wait for the aborted workers to settle before reading the
                // counters; a write finishing between the abort and the
                // snapshot would otherwise be counted persisted and dropped.
                pool.abort_and_wait().await;

                let abandoned = self.stats.snapshot().in_flight;
                if abandoned > 0 {
                    self.stats.record_dropped(abandoned);
                }

                warn!(
                    pipeline_id = self.config.id,
                    abandoned, "shutdown timeout elapsed before the pipeline drained"
                );
                Err(crate::seed_error!(
                    ErrorKind::ShutdownTimeout,
                    "Pipeline failed to drain in time",
                    format!("{abandoned} in-flight records were abandoned and counted as dropped")
                ))
            }
        };

        self.phase_tx.terminate();
        if let Some(monitor) = self.monitor.take() {
            let _ = monitor.await;
        }

        let snapshot = self.stats.snapshot();
        info!(
            pipeline_id = self.config.id,
            enqueued = snapshot.enqueued,
            persisted = snapshot.persisted,
            dropped = snapshot.dropped,
            "ingestion pipeline terminated"
        );

        result
    }
}
