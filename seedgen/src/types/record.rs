use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

/// Name of a destination table.
///
/// Cheap to clone; many records share the same table name, so the underlying
/// string is reference counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(Arc<str>);

impl TableName {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A typed value held by one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Uuid(Uuid),
    Text(String),
    /// Nullable text column; `None` is written as SQL NULL.
    OptionalText(Option<String>),
    Bool(bool),
    Int(i32),
    Date(NaiveDate),
}

/// A generated entity tagged with its destination table and an ordered field
/// map. Immutable once produced.
///
/// The first field is the record's primary key; retried writes rely on it for
/// conflict detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: TableName,
    fields: Vec<(&'static str, FieldValue)>,
}

impl Record {
    pub fn new(table: TableName, fields: Vec<(&'static str, FieldValue)>) -> Self {
        debug_assert!(!fields.is_empty(), "a record must have at least one field");

        Self { table, fields }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.fields
    }

    /// Column names in field order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// The value of the record's first field, treated as its primary key.
    pub fn primary_key(&self) -> &FieldValue {
        &self.fields[0].1
    }
}

/// An ordered sequence of records sharing one destination table.
///
/// The unit of persistence and of retry. Sealed by the batch assembler, which
/// guarantees `1 <= len <= max_size`.
#[derive(Debug, Clone)]
pub struct Batch {
    table: TableName,
    records: Vec<Record>,
}

impl Batch {
    pub fn new(table: TableName, records: Vec<Record>) -> Self {
        debug_assert!(!records.is_empty(), "a batch must contain at least one record");
        debug_assert!(
            records.iter().all(|record| *record.table() == table),
            "all records in a batch must target the same table"
        );

        Self { table, records }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(table: &TableName, id: u128) -> Record {
        Record::new(
            table.clone(),
            vec![("id", FieldValue::Uuid(Uuid::from_u128(id)))],
        )
    }

    #[test]
    fn table_names_compare_by_content() {
        assert_eq!(TableName::from("students_a"), TableName::new("students_a"));
        assert_ne!(TableName::from("students_a"), TableName::from("students_b"));
    }

    #[test]
    fn batch_exposes_table_and_len() {
        let table = TableName::from("school_table");
        let batch = Batch::new(table.clone(), vec![record(&table, 1), record(&table, 2)]);
        assert_eq!(batch.table(), &table);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn primary_key_is_first_field() {
        let table = TableName::from("school_table");
        let rec = record(&table, 7);
        assert_eq!(rec.primary_key(), &FieldValue::Uuid(Uuid::from_u128(7)));
    }
}
