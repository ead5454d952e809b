use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::destination::Destination;
use crate::error::SeedResult;
use crate::types::{Batch, FieldValue, Record, TableName};

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<TableName, Vec<Record>>,
    seen_keys: HashMap<TableName, HashSet<String>>,
}

/// In-memory destination for testing and development.
///
/// Stores every written record in a per-table vector and can be inspected
/// after a pipeline run. Mirrors the conflict behavior of a real store:
/// records whose primary key was already written are silently skipped, so
/// retried batches do not double count.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a new empty memory destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all records written to `table` so far, in arrival order.
    pub async fn table_records(&self, table: &TableName) -> Vec<Record> {
        let inner = self.inner.lock().await;
        inner.tables.get(table).cloned().unwrap_or_default()
    }

    /// Returns the total number of records persisted across all tables.
    pub async fn total_records(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.tables.values().map(Vec::len).sum()
    }

    /// Returns the tables that have received at least one record.
    pub async fn tables(&self) -> Vec<TableName> {
        let inner = self.inner.lock().await;
        inner.tables.keys().cloned().collect()
    }
}

fn key_of(record: &Record) -> String {
    match record.primary_key() {
        FieldValue::Uuid(id) => id.to_string(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::OptionalText(text) => text.clone().unwrap_or_default(),
        FieldValue::Bool(flag) => flag.to_string(),
        FieldValue::Int(value) => value.to_string(),
        FieldValue::Date(date) => date.to_string(),
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn write_batch(&self, batch: &Batch) -> SeedResult<u64> {
        let mut inner = self.inner.lock().await;

        let seen = inner.seen_keys.entry(batch.table().clone()).or_default();
        let mut fresh = Vec::with_capacity(batch.len());
        for record in batch.records() {
            if seen.insert(key_of(record)) {
                fresh.push(record.clone());
            }
        }

        let persisted = fresh.len() as u64;
        inner
            .tables
            .entry(batch.table().clone())
            .or_default()
            .extend(fresh);

        info!(
            table = %batch.table(),
            records = batch.len(),
            persisted,
            "wrote batch to memory destination"
        );

        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn batch(table: &TableName, ids: &[u128]) -> Batch {
        let records = ids
            .iter()
            .map(|id| {
                Record::new(
                    table.clone(),
                    vec![("id", FieldValue::Uuid(Uuid::from_u128(*id)))],
                )
            })
            .collect();
        Batch::new(table.clone(), records)
    }

    #[tokio::test]
    async fn stores_records_per_table() {
        let destination = MemoryDestination::new();
        let table = TableName::from("students_x");

        let persisted = destination.write_batch(&batch(&table, &[1, 2, 3])).await.unwrap();
        assert_eq!(persisted, 3);
        assert_eq!(destination.table_records(&table).await.len(), 3);
    }

    #[tokio::test]
    async fn replayed_records_are_skipped() {
        let destination = MemoryDestination::new();
        let table = TableName::from("students_x");

        destination.write_batch(&batch(&table, &[1, 2])).await.unwrap();
        let persisted = destination.write_batch(&batch(&table, &[2, 3])).await.unwrap();

        assert_eq!(persisted, 1);
        assert_eq!(destination.total_records().await, 3);
    }
}
