//! Worker that assembles queued records into batches and writes them.
//!
//! Each worker polls the shared ingestion queue and groups records per
//! destination table. A batch is sealed and written when it reaches the
//! configured size, or when its oldest record has waited longer than the
//! configured fill window. When the queue closes, remaining partial batches
//! are flushed before the worker exits, so draining loses nothing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use schoolseed_config::shared::BatchConfig;

use crate::concurrency::signal::SignalTx;
use crate::destination::Destination;
use crate::error::SeedResult;
use crate::queue::{IngestionQueue, PollOutcome};
use crate::types::{Batch, Record, TableName};
use crate::writer::RetryingWriter;

#[derive(Debug)]
struct TableBuffer {
    records: Vec<Record>,
    opened_at: Instant,
}

/// One batch assembler worker; the pipeline runs a pool of these.
#[derive(Debug)]
pub struct BatchAssemblerWorker<D> {
    worker_id: usize,
    queue: IngestionQueue,
    writer: RetryingWriter<D>,
    batch: BatchConfig,
    fatal_tx: SignalTx,
}

impl<D: Destination> BatchAssemblerWorker<D> {
    pub fn new(
        worker_id: usize,
        queue: IngestionQueue,
        writer: RetryingWriter<D>,
        batch: BatchConfig,
        fatal_tx: SignalTx,
    ) -> Self {
        Self {
            worker_id,
            queue,
            writer,
            batch,
            fatal_tx,
        }
    }

    /// Runs until the queue is closed and drained, or until the writer
    /// reports a fatal error.
    ///
    /// On a fatal error the shared fatal signal is raised before returning,
    /// so the pipeline can stop producers and drain the other workers.
    pub async fn run(mut self) -> SeedResult<()> {
        debug!(worker_id = self.worker_id, "batch assembler worker started");

        let result = self.run_inner().await;
        if result.is_err() {
            let _ = self.fatal_tx.send(());
        }

        result
    }

    async fn run_inner(&mut self) -> SeedResult<()> {
        let max_fill = self.batch.max_fill();
        let mut buffers: HashMap<TableName, TableBuffer> = HashMap::new();

        loop {
            let timeout = next_deadline(&buffers, max_fill)
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(max_fill);

            match self.queue.poll(timeout).await {
                PollOutcome::Record(record) => {
                    let table = record.table().clone();
                    let buffer = buffers.entry(table.clone()).or_insert_with(|| TableBuffer {
                        records: Vec::with_capacity(self.batch.max_size),
                        opened_at: Instant::now(),
                    });
                    buffer.records.push(record);

                    if buffer.records.len() >= self.batch.max_size
                        && let Some(buffer) = buffers.remove(&table)
                    {
                        self.write_buffer(table, buffer).await?;
                    }

                    self.flush_expired(&mut buffers, max_fill).await?;
                }
                PollOutcome::TimedOut => {
                    self.flush_expired(&mut buffers, max_fill).await?;
                }
                PollOutcome::Closed => {
                    self.flush_all(&mut buffers).await?;
                    info!(
                        worker_id = self.worker_id,
                        "ingestion queue drained, batch assembler worker exiting"
                    );
                    return Ok(());
                }
            }
        }
    }

    async fn flush_expired(
        &self,
        buffers: &mut HashMap<TableName, TableBuffer>,
        max_fill: Duration,
    ) -> SeedResult<()> {
        let now = Instant::now();
        let expired: Vec<TableName> = buffers
            .iter()
            .filter(|(_, buffer)| now.duration_since(buffer.opened_at) >= max_fill)
            .map(|(table, _)| table.clone())
            .collect();

        for table in expired {
            if let Some(buffer) = buffers.remove(&table) {
                self.write_buffer(table, buffer).await?;
            }
        }

        Ok(())
    }

    async fn flush_all(&self, buffers: &mut HashMap<TableName, TableBuffer>) -> SeedResult<()> {
        for (table, buffer) in buffers.drain() {
            let records = buffer.records;
            if records.is_empty() {
                continue;
            }
            self.writer.write(&Batch::new(table, records)).await?;
        }

        Ok(())
    }

    async fn write_buffer(&self, table: TableName, buffer: TableBuffer) -> SeedResult<()> {
        if buffer.records.is_empty() {
            return Ok(());
        }

        self.writer
            .write(&Batch::new(table, buffer.records))
            .await?;

        Ok(())
    }
}

fn next_deadline(
    buffers: &HashMap<TableName, TableBuffer>,
    max_fill: Duration,
) -> Option<Instant> {
    buffers
        .values()
        .map(|buffer| buffer.opened_at + max_fill)
        .min()
}
