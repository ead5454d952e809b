use std::sync::Arc;

use rand::thread_rng;
use tracing::{debug, info, warn};

use schoolseed_config::shared::{DestinationConfig, PipelineConfig, PlanConfig, SeederConfig};
use seedgen::destination::postgres::SCHOOL_TABLE;
use seedgen::destination::{Destination, MemoryDestination, PostgresDestination};
use seedgen::error::ErrorKind;
use seedgen::generate::{GenerationCaches, PlanCursor, School, SchoolGenerator, StudentGenerator};
use seedgen::pipeline::{Pipeline, RecordProducer};
use seedgen::profile::ResourceProfile;
use seedgen::types::TableName;

/// Starts the seeder with the provided configuration.
///
/// Detects host resources, connects the configured destination, generates
/// the schools, and streams student records through the ingestion pipeline
/// until the plan is exhausted or an interrupt arrives.
pub async fn start_seeder_with_config(config: SeederConfig) -> anyhow::Result<()> {
    info!("starting seeder service");

    log_config(&config);

    let profile = ResourceProfile::detect()?;
    info!(
        cpu_cores = profile.cpu_cores,
        total_memory_mb = profile.total_memory_bytes / (1024 * 1024),
        workers = config.pipeline.worker_count.unwrap_or_else(|| profile.worker_count()),
        "detected host resources"
    );

    match &config.destination {
        DestinationConfig::Memory => {
            let destination = MemoryDestination::new();
            run_seeding(config.pipeline, config.plan, profile, destination).await
        }
        DestinationConfig::Postgres { connection } => {
            let destination = PostgresDestination::connect(connection, &profile).await?;
            run_seeding(config.pipeline, config.plan, profile, destination).await
        }
    }
}

async fn run_seeding<D>(
    pipeline_config: PipelineConfig,
    plan: PlanConfig,
    profile: ResourceProfile,
    destination: D,
) -> anyhow::Result<()>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    let caches = GenerationCaches::new(&pipeline_config.caches);

    // Generate schools and make sure every destination table exists before
    // any record is enqueued.
    let school_table = TableName::from(SCHOOL_TABLE);
    destination.prepare_table(&school_table).await?;

    let mut school_generator = SchoolGenerator::new();
    let schools: Vec<School> = {
        let mut rng = thread_rng();
        (0..plan.schools)
            .map(|_| school_generator.generate(&mut rng))
            .collect()
    };
    for school in &schools {
        destination.prepare_table(&school.student_table).await?;
    }
    info!(schools = schools.len(), "generated schools and prepared tables");

    let mut pipeline = Pipeline::new(pipeline_config, &profile, destination);
    pipeline.start().await?;

    let producer = pipeline.producer();
    let produce = tokio::spawn(produce_records(
        producer,
        schools,
        school_table,
        plan,
        caches,
    ));

    let produce_result: anyhow::Result<()> = tokio::select! {
        produced = produce => {
            let result = produced.map_err(anyhow::Error::from).and_then(|inner| inner);
            match &result {
                Ok(()) => info!("generation plan exhausted, draining pipeline"),
                Err(err) => warn!(error = %err, "record generation failed, draining pipeline"),
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, draining pipeline");
            Ok(())
        }
    };

    drain_and_report(pipeline, produce_result).await
}

/// Drains the pipeline, reports the final summary, and surfaces any
/// production failure.
///
/// The drain runs even when record generation failed, so records already in
/// the queue are flushed and the final summary accounts for every enqueued
/// record.
async fn drain_and_report<D>(
    pipeline: Pipeline<D>,
    produce_result: anyhow::Result<()>,
) -> anyhow::Result<()>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    let drained = pipeline.shutdown_and_wait().await;
    produce_result?;

    let snapshot = drained?;
    info!(
        enqueued = snapshot.enqueued,
        persisted = snapshot.persisted,
        dropped = snapshot.dropped,
        "seeding complete"
    );

    Ok(())
}

/// Enqueues the school registry rows and every student in the plan.
///
/// A closed queue means the pipeline began draining underneath us, which is
/// an orderly stop rather than a failure; the pipeline surfaces the root
/// cause from `shutdown_and_wait`.
async fn produce_records(
    producer: RecordProducer,
    schools: Vec<School>,
    school_table: TableName,
    plan: PlanConfig,
    caches: Arc<GenerationCaches>,
) -> anyhow::Result<()> {
    let generator = StudentGenerator::new(caches);
    let mut cursor = PlanCursor::new(&plan);
    let total_students = plan.total_students();

    for school in &schools {
        if let Err(err) = producer.enqueue(school.registry_record(school_table.clone())).await {
            if err.kind() == ErrorKind::QueueClosed {
                warn!("pipeline stopped accepting records during school registration");
                return Ok(());
            }
            return Err(err.into());
        }
    }

    for _ in 0..total_students {
        let (school_index, seat) = cursor.next_seat();
        let record = {
            let mut rng = thread_rng();
            generator.generate(&mut rng, &schools[school_index as usize], seat)?
        };

        if let Err(err) = producer.enqueue(record).await {
            if err.kind() == ErrorKind::QueueClosed {
                warn!("pipeline stopped accepting records mid-plan");
                return Ok(());
            }
            return Err(err.into());
        }
    }

    Ok(())
}

fn log_config(config: &SeederConfig) {
    match &config.destination {
        DestinationConfig::Memory => debug!("using memory destination config"),
        DestinationConfig::Postgres { connection } => debug!(
            host = connection.host,
            port = connection.port,
            database = connection.name,
            "using postgres destination config"
        ),
    }

    debug!(
        pipeline_id = config.pipeline.id,
        queue_capacity = config.pipeline.queue_capacity,
        batch_max_size = config.pipeline.batch.max_size,
        batch_max_fill_ms = config.pipeline.batch.max_fill_ms,
        max_consecutive_errors = config.pipeline.max_consecutive_errors,
        "pipeline config"
    );

    debug!(
        schools = config.plan.schools,
        classes = config.plan.classes,
        sections = config.plan.sections,
        students_per_section = config.plan.students_per_section,
        total_students = config.plan.total_students(),
        "generation plan"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::anyhow;
    use schoolseed_config::shared::{BatchConfig, CacheConfig, MemoryPressureConfig, RetryConfig};
    use schoolseed_telemetry::tracing::init_test_tracing;
    use seedgen::types::{FieldValue, Record};

    fn pipeline_config() -> PipelineConfig {
        PipelineConfig {
            id: 99,
            queue_capacity: 100,
            worker_count: Some(1),
            batch: BatchConfig {
                max_size: 10,
                max_fill_ms: 50,
            },
            write_retry: RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 10,
                max_delay_ms: 100,
                backoff_factor: 2.0,
            },
            max_consecutive_errors: 10,
            shutdown_timeout_ms: 5_000,
            progress_interval_ms: 500,
            caches: CacheConfig {
                phone_capacity: 100,
                national_id_capacity: 100,
                name_pair_capacity: 100,
                max_generation_attempts: 100,
            },
            memory: MemoryPressureConfig {
                high_watermark: 0.80,
                critical_watermark: 0.92,
            },
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_production_still_drains_queued_records() {
        init_test_tracing();

        let destination = MemoryDestination::new();
        let profile = ResourceProfile {
            cpu_cores: 2,
            total_memory_bytes: 8 * 1024 * 1024 * 1024,
        };
        let mut pipeline = Pipeline::new(pipeline_config(), &profile, destination.clone());
        pipeline.start().await.unwrap();

        let stats = pipeline.stats();
        let producer = pipeline.producer();
        let table = TableName::from("students_drain");
        for i in 0..7 {
            let record = Record::new(table.clone(), vec![("id", FieldValue::Int(i))]);
            producer.enqueue(record).await.unwrap();
        }

        let err = drain_and_report(pipeline, Err(anyhow!("name pool exhausted")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("name pool exhausted"));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.persisted, 7);
        assert_eq!(snapshot.enqueued, snapshot.persisted + snapshot.dropped);
        assert_eq!(destination.total_records().await, 7);
    }
}
