use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};

use crate::metrics::{
    PIPELINE_ID_LABEL, SEED_RECORDS_DROPPED_TOTAL, SEED_RECORDS_ENQUEUED_TOTAL,
    SEED_RECORDS_IN_FLIGHT, SEED_RECORDS_PERSISTED_TOTAL,
};
use crate::types::PipelineId;

/// A consistent point-in-time view of the pipeline's record accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub persisted: u64,
    pub dropped: u64,
    pub in_flight: u64,
}

/// Shared record accounting for one pipeline run.
///
/// Invariant once the pipeline has drained: `enqueued == persisted + dropped`.
/// Every enqueued record is eventually counted exactly once as persisted or
/// dropped.
#[derive(Debug)]
pub struct PipelineStats {
    pipeline_id: PipelineId,
    enqueued: AtomicU64,
    persisted: AtomicU64,
    dropped: AtomicU64,
    in_flight: AtomicU64,
}

impl PipelineStats {
    pub fn new(pipeline_id: PipelineId) -> Arc<Self> {
        Arc::new(Self {
            pipeline_id,
            enqueued: AtomicU64::new(0),
            persisted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
        })
    }

    pub fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }

    pub fn record_enqueued(&self, count: u64) {
        self.enqueued.fetch_add(count, Ordering::Relaxed);
        self.in_flight.fetch_add(count, Ordering::Relaxed);
        self.emit(SEED_RECORDS_ENQUEUED_TOTAL, count);
        self.emit_in_flight();
    }

    /// Backs out records counted by [`record_enqueued`] that were never
    /// stored, e.g. a put rejected by a closed queue.
    ///
    /// The exporter counter is monotonic and is not rewound here; only the
    /// atomics and the in-flight gauge are corrected.
    ///
    /// [`record_enqueued`]: Self::record_enqueued
    pub fn revert_enqueued(&self, count: u64) {
        self.enqueued.fetch_sub(count, Ordering::Relaxed);
        self.in_flight.fetch_sub(count, Ordering::Relaxed);
        self.emit_in_flight();
    }

    pub fn record_persisted(&self, count: u64) {
        self.persisted.fetch_add(count, Ordering::Relaxed);
        self.in_flight.fetch_sub(count, Ordering::Relaxed);
        self.emit(SEED_RECORDS_PERSISTED_TOTAL, count);
        self.emit_in_flight();
    }

    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
        self.in_flight.fetch_sub(count, Ordering::Relaxed);
        self.emit(SEED_RECORDS_DROPPED_TOTAL, count);
        self.emit_in_flight();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }

    fn emit(&self, name: &'static str, count: u64) {
        counter!(name, PIPELINE_ID_LABEL => self.pipeline_id.to_string()).increment(count);
    }

    fn emit_in_flight(&self) {
        gauge!(SEED_RECORDS_IN_FLIGHT, PIPELINE_ID_LABEL => self.pipeline_id.to_string())
            .set(self.in_flight.load(Ordering::Relaxed) as f64);
    }
}
