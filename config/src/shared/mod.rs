//! Shared configuration types for the seeding pipeline.

mod batch;
mod connection;
mod pipeline;
mod retry;
mod seeder;

pub use batch::BatchConfig;
pub use connection::PgConnectionConfig;
pub use pipeline::{CacheConfig, MemoryPressureConfig, PipelineConfig};
pub use retry::RetryConfig;
pub use seeder::{DestinationConfig, PlanConfig, SeederConfig};

use thiserror::Error;

/// Errors produced when validating configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field holds a value outside its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue {
        field: String,
        constraint: String,
    },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, constraint: &str) -> Self {
        ValidationError::InvalidFieldValue {
            field: field.to_string(),
            constraint: constraint.to_string(),
        }
    }
}
