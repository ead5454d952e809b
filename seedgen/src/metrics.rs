//! Metric names and labels emitted by the pipeline.

pub const PIPELINE_ID_LABEL: &str = "pipeline_id";
pub const TABLE_NAME_LABEL: &str = "table";

/// Records accepted into the ingestion queue.
pub const SEED_RECORDS_ENQUEUED_TOTAL: &str = "seed_records_enqueued_total";
/// Records durably written to the destination.
pub const SEED_RECORDS_PERSISTED_TOTAL: &str = "seed_records_persisted_total";
/// Records abandoned after retry exhaustion or shutdown timeout.
pub const SEED_RECORDS_DROPPED_TOTAL: &str = "seed_records_dropped_total";
/// Records enqueued but not yet persisted or dropped.
pub const SEED_RECORDS_IN_FLIGHT: &str = "seed_records_in_flight";

pub const SEED_BATCHES_WRITTEN_TOTAL: &str = "seed_batches_written_total";
pub const SEED_BATCH_WRITE_ATTEMPTS_TOTAL: &str = "seed_batch_write_attempts_total";
pub const SEED_BATCH_WRITE_FAILURES_TOTAL: &str = "seed_batch_write_failures_total";
pub const SEED_BATCH_WRITE_DURATION_SECONDS: &str = "seed_batch_write_duration_seconds";

pub const SEED_MEMORY_USED_PERCENT: &str = "seed_memory_used_percent";
