use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};

use schoolseed_config::shared::PgConnectionConfig;

use crate::bail;
use crate::destination::Destination;
use crate::error::{ErrorKind, SeedResult};
use crate::profile::ResourceProfile;
use crate::types::{Batch, FieldValue, TableName};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// The registry of schools; one row per generated school.
pub const SCHOOL_TABLE: &str = "school_table";

// Postgres caps bind parameters at u16::MAX per statement.
const BIND_LIMIT: usize = 65_535;

/// How many rows fit into one multi-row insert for a record with
/// `column_count` bound columns.
fn rows_per_insert(column_count: usize) -> usize {
    (BIND_LIMIT / column_count).max(1)
}

/// Postgres destination backed by a sized connection pool.
///
/// Cloning shares the pool, so every batch assembler worker writes through
/// the same set of connections. Batches are applied as a single multi-row
/// `INSERT ... ON CONFLICT DO NOTHING`, which makes retried batches
/// idempotent at the record level.
#[derive(Debug, Clone)]
pub struct PostgresDestination {
    pool: PgPool,
}

impl PostgresDestination {
    /// Connects to Postgres with a pool sized from the host profile.
    pub async fn connect(
        config: &PgConnectionConfig,
        profile: &ResourceProfile,
    ) -> SeedResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(profile.max_connections())
            .min_connections(profile.min_idle_connections())
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .max_lifetime(MAX_LIFETIME)
            .connect_with(config.with_db())
            .await?;

        info!(
            max_connections = profile.max_connections(),
            min_connections = profile.min_idle_connections(),
            "connected to postgres destination"
        );

        Ok(Self { pool })
    }

    /// Builds a destination around an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn create_school_table(&self) -> SeedResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS school_table (
                school_uuid UUID PRIMARY KEY,
                school_name VARCHAR(255) NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_student_table(&self, table: &TableName) -> SeedResult<()> {
        // The table name is interpolated into DDL, so it must have passed
        // through the sanitizer. Reject anything else outright.
        if !is_safe_identifier(table.as_str()) {
            bail!(
                ErrorKind::InvalidRecord,
                "Unsafe destination table name",
                format!("'{table}' contains characters outside [a-z0-9_]")
            );
        }

        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                student_uuid UUID PRIMARY KEY,
                full_name VARCHAR(100) NOT NULL,
                guardian_name VARCHAR(100) NOT NULL,
                gender VARCHAR(10) NOT NULL,
                blood_group VARCHAR(5) NOT NULL,
                birth_date DATE NOT NULL,
                national_id VARCHAR(20) NOT NULL UNIQUE,
                class_name VARCHAR(20) NOT NULL,
                section VARCHAR(5) NOT NULL,
                roll_no INTEGER NOT NULL,
                religion VARCHAR(20) NOT NULL,
                parent_occupation VARCHAR(100) NOT NULL,
                concession_needed BOOLEAN NOT NULL,
                concession_type VARCHAR(50),
                medical_condition VARCHAR(50),
                student_phone VARCHAR(15) NOT NULL UNIQUE,
                guardian_phone VARCHAR(15) NOT NULL UNIQUE,
                image_url TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        Ok(())
    }
}

fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn bind_value<'a>(builder: &mut sqlx::query_builder::Separated<'_, 'a, Postgres, &'static str>, value: &'a FieldValue) {
    match value {
        FieldValue::Uuid(id) => {
            builder.push_bind(*id);
        }
        FieldValue::Text(text) => {
            builder.push_bind(text.as_str());
        }
        FieldValue::OptionalText(text) => {
            builder.push_bind(text.as_deref());
        }
        FieldValue::Bool(flag) => {
            builder.push_bind(*flag);
        }
        FieldValue::Int(value) => {
            builder.push_bind(*value);
        }
        FieldValue::Date(date) => {
            builder.push_bind(*date);
        }
    }
}

impl Destination for PostgresDestination {
    fn name() -> &'static str {
        "postgres"
    }

    async fn prepare_table(&self, table: &TableName) -> SeedResult<()> {
        if table.as_str() == SCHOOL_TABLE {
            self.create_school_table().await
        } else {
            self.create_student_table(table).await
        }
    }

    async fn write_batch(&self, batch: &Batch) -> SeedResult<u64> {
        let table = batch.table();
        if !is_safe_identifier(table.as_str()) {
            bail!(
                ErrorKind::InvalidRecord,
                "Unsafe destination table name",
                format!("'{table}' contains characters outside [a-z0-9_]")
            );
        }

        // All records in a batch share a table, and the generator emits a
        // fixed column set per table, so the first record's columns apply to
        // the whole batch.
        let first = &batch.records()[0];
        let columns = first.column_names().collect::<Vec<_>>().join(", ");

        // Oversized batches are split so no single insert exceeds the bind
        // parameter limit. Each chunk stays idempotent on its own.
        let chunk_rows = rows_per_insert(first.fields().len());

        let mut persisted = 0;
        for chunk in batch.records().chunks(chunk_rows) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO {table} ({columns}) "));
            builder.push_values(chunk, |mut row, record| {
                for (_, value) in record.fields() {
                    bind_value(&mut row, value);
                }
            });
            builder.push(" ON CONFLICT DO NOTHING");

            let result = builder.build().execute(&self.pool).await?;
            persisted += result.rows_affected();
        }

        debug!(
            table = %table,
            records = batch.len(),
            persisted,
            "wrote batch to postgres destination"
        );

        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_chunks_stay_under_the_bind_limit() {
        // 18 bound columns per student row.
        assert_eq!(rows_per_insert(18), 3_640);
        assert!(rows_per_insert(18) * 18 <= BIND_LIMIT);
        assert_eq!(rows_per_insert(2), 32_767);
        assert_eq!(rows_per_insert(BIND_LIMIT + 1), 1);
    }

    #[test]
    fn identifier_safety() {
        assert!(is_safe_identifier("students_green_valley_academy"));
        assert!(is_safe_identifier("school_table"));
        assert!(!is_safe_identifier("students_x; DROP TABLE y"));
        assert!(!is_safe_identifier("Students_X"));
        assert!(!is_safe_identifier(""));
    }
}
