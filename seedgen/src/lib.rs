//! Concurrent batched ingestion of synthetic school records.
//!
//! Generated records flow through a bounded queue into batch assembler workers,
//! which group them by destination table and hand sealed batches to a retrying
//! writer. Backpressure propagates from the destination all the way to the
//! producers through the queue's capacity bound.

pub mod cache;
pub mod concurrency;
pub mod destination;
pub mod error;
pub mod generate;
mod macros;
pub mod metrics;
pub mod monitor;
pub mod pipeline;
pub mod profile;
pub mod queue;
pub mod stats;
pub mod types;
pub mod workers;
pub mod writer;
