//! The bounded handoff between record producers and batch assemblers.
//!
//! Built on a tokio mpsc channel: `put` awaits until capacity frees up, which
//! gives producers natural backpressure, and multiple assembler workers share
//! the receiver behind a mutex. Closing the queue rejects further puts while
//! still letting consumers drain whatever is buffered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::bail;
use crate::error::{ErrorKind, SeedResult};
use crate::types::Record;

/// The result of a single [`IngestionQueue::poll`] call.
#[derive(Debug)]
pub enum PollOutcome {
    /// A record was taken from the queue.
    Record(Record),
    /// The timeout elapsed with the queue still open but empty.
    TimedOut,
    /// The queue is closed and fully drained; no more records will arrive.
    Closed,
}

/// Bounded multi-producer multi-consumer record queue.
#[derive(Debug, Clone)]
pub struct IngestionQueue {
    capacity: usize,
    tx: mpsc::Sender<Record>,
    rx: Arc<Mutex<mpsc::Receiver<Record>>>,
}

impl IngestionQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            capacity,
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueues a record, waiting for capacity if the queue is full.
    ///
    /// Fails with [`ErrorKind::QueueClosed`] once [`close`](Self::close) has
    /// been called; the record is never silently discarded.
    pub async fn put(&self, record: Record) -> SeedResult<()> {
        if self.tx.send(record).await.is_err() {
            bail!(
                ErrorKind::QueueClosed,
                "Record rejected by ingestion queue",
                "the queue was closed while a producer was enqueuing"
            );
        }

        Ok(())
    }

    /// Takes the next record, waiting at most `timeout`.
    ///
    /// Consumers distinguish an idle queue ([`PollOutcome::TimedOut`]) from a
    /// drained one ([`PollOutcome::Closed`]) so they can flush partial batches
    /// in the former case and exit in the latter.
    pub async fn poll(&self, timeout: Duration) -> PollOutcome {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(record)) => PollOutcome::Record(record),
            Ok(None) => PollOutcome::Closed,
            Err(_) => PollOutcome::TimedOut,
        }
    }

    /// Stops accepting new records.
    ///
    /// Records already buffered remain available to `poll` until drained.
    pub async fn close(&self) {
        self.rx.lock().await.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, Record, TableName};
    use uuid::Uuid;

    fn record() -> Record {
        Record::new(
            TableName::from("t"),
            vec![("id", FieldValue::Uuid(Uuid::new_v4()))],
        )
    }

    #[tokio::test]
    async fn put_then_poll_returns_record() {
        let queue = IngestionQueue::new(4);
        queue.put(record()).await.unwrap();

        match queue.poll(Duration::from_millis(50)).await {
            PollOutcome::Record(_) => {}
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_times_out_on_empty_open_queue() {
        let queue = IngestionQueue::new(4);
        assert!(matches!(
            queue.poll(Duration::from_millis(10)).await,
            PollOutcome::TimedOut
        ));
    }

    #[tokio::test]
    async fn closed_queue_rejects_put_but_drains() {
        let queue = IngestionQueue::new(4);
        queue.put(record()).await.unwrap();
        queue.close().await;

        let err = queue.put(record()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueueClosed);

        assert!(matches!(
            queue.poll(Duration::from_millis(10)).await,
            PollOutcome::Record(_)
        ));
        assert!(matches!(
            queue.poll(Duration::from_millis(10)).await,
            PollOutcome::Closed
        ));
    }

    #[tokio::test]
    async fn full_queue_blocks_until_capacity_frees() {
        let queue = IngestionQueue::new(1);
        queue.put(record()).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(20), queue.put(record())).await;
        assert!(blocked.is_err(), "put should wait while the queue is full");

        let consumer = queue.clone();
        let handle = tokio::spawn(async move { consumer.poll(Duration::from_secs(1)).await });

        queue.put(record()).await.unwrap();
        assert!(matches!(handle.await.unwrap(), PollOutcome::Record(_)));
    }
}
