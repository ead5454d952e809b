use std::future::Future;

use crate::error::SeedResult;
use crate::types::{Batch, TableName};

/// Trait for stores that can receive generated record batches.
///
/// Implementations must be safe to call concurrently, since every batch
/// assembler worker writes through a clone of the same destination. Writes
/// must also be idempotent at the record level: a failed batch is retried
/// whole, so records from a partially applied attempt may arrive again.
pub trait Destination {
    /// Returns the name of the destination, used in logs.
    fn name() -> &'static str;

    /// Ensures the given table exists and is ready to receive records.
    ///
    /// Called once per table before any batch targets it. The default
    /// implementation is a no-op for stores that need no preparation.
    fn prepare_table(&self, _table: &TableName) -> impl Future<Output = SeedResult<()>> + Send {
        async { Ok(()) }
    }

    /// Writes one batch, returning the number of records newly persisted.
    ///
    /// Records already present (from a retried attempt or a uniqueness cache
    /// eviction) are skipped, not errors, which is why the returned count can
    /// be lower than the batch length.
    fn write_batch(&self, batch: &Batch) -> impl Future<Output = SeedResult<u64>> + Send;
}
