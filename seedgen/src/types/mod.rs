//! Core data types flowing through the pipeline.

mod record;

pub use record::{Batch, FieldValue, Record, TableName};

/// Unique identifier for a pipeline run, used as a metrics label.
pub type PipelineId = u64;
