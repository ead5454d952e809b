mod support;

use std::time::Duration;

use schoolseed_telemetry::tracing::init_test_tracing;
use seedgen::destination::MemoryDestination;
use seedgen::error::ErrorKind;
use seedgen::pipeline::Pipeline;
use seedgen::profile::ResourceProfile;
use seedgen::types::TableName;

use support::{
    BlockingDestination, FailureMode, FlakyDestination, HangingDestination, RecordingDestination,
    test_pipeline_config, test_record,
};

fn profile() -> ResourceProfile {
    ResourceProfile {
        cpu_cores: 2,
        total_memory_bytes: 4 * 1024 * 1024 * 1024,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn records_flow_through_batches_to_the_destination() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let mut pipeline = Pipeline::new(test_pipeline_config(1), &profile(), destination.clone());
    pipeline.start().await.unwrap();

    let table = TableName::from("students_test_school");
    let producer = pipeline.producer();
    for _ in 0..120 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    let snapshot = pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(snapshot.enqueued, 120);
    assert_eq!(snapshot.persisted, 120);
    assert_eq!(snapshot.dropped, 0);
    assert_eq!(snapshot.in_flight, 0);
    assert_eq!(destination.table_records(&table).await.len(), 120);
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_batches_are_flushed_on_drain() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let mut config = test_pipeline_config(2);
    config.batch.max_size = 500;
    config.batch.max_fill_ms = 60_000;
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());
    pipeline.start().await.unwrap();

    let table = TableName::from("students_partial");
    let producer = pipeline.producer();
    for _ in 0..42 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    let snapshot = pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(snapshot.persisted, 42);
    assert_eq!(destination.table_records(&table).await.len(), 42);
}

#[tokio::test(flavor = "multi_thread")]
async fn batches_spread_across_tables() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    let mut pipeline = Pipeline::new(test_pipeline_config(3), &profile(), destination.clone());
    pipeline.start().await.unwrap();

    let table_a = TableName::from("students_school_a");
    let table_b = TableName::from("students_school_b");
    let producer = pipeline.producer();
    for i in 0..100 {
        let table = if i % 2 == 0 { &table_a } else { &table_b };
        producer.enqueue(test_record(table)).await.unwrap();
    }

    let snapshot = pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(snapshot.persisted, 100);
    assert_eq!(destination.table_records(&table_a).await.len(), 50);
    assert_eq!(destination.table_records(&table_b).await.len(), 50);
}

#[tokio::test(flavor = "multi_thread")]
async fn batches_seal_at_max_size_and_stay_single_table() {
    init_test_tracing();

    let destination = RecordingDestination::new();
    let mut config = test_pipeline_config(9);
    config.worker_count = Some(1);
    config.batch.max_size = 50;
    config.batch.max_fill_ms = 60_000;
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());

    // Enqueue before starting so the single worker sees all 120 records up
    // front and seals deterministically.
    let table = TableName::from("students_sealing");
    let producer = pipeline.producer();
    for _ in 0..120 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    pipeline.start().await.unwrap();
    let snapshot = pipeline.shutdown_and_wait().await.unwrap();
    assert_eq!(snapshot.persisted, 120);

    // 120 records at max_size 50 make exactly two full batches and one
    // partial flush on drain.
    let batches = destination.batches();
    let sizes: Vec<usize> = batches.iter().map(|(_, len)| *len).collect();
    assert_eq!(sizes, vec![50, 50, 20]);
    for (batch_table, len) in &batches {
        assert_eq!(batch_table, &table);
        assert!(*len >= 1 && *len <= 50);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_are_retried_until_success() {
    init_test_tracing();

    let destination = FlakyDestination::new(FailureMode::FailFirst(2));
    let mut config = test_pipeline_config(4);
    config.worker_count = Some(1);
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());

    // Enqueue before starting so the batch assembles in one piece.
    let table = TableName::from("students_retry");
    let producer = pipeline.producer();
    for _ in 0..10 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    pipeline.start().await.unwrap();

    let snapshot = pipeline.shutdown_and_wait().await.unwrap();

    // Two injected failures, then the third attempt lands the batch.
    assert_eq!(destination.attempts(), 3);
    assert_eq!(snapshot.persisted, 10);
    assert_eq!(snapshot.dropped, 0);
    assert_eq!(destination.inner().total_records().await, 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_retries_drop_the_batch() {
    init_test_tracing();

    let destination = FlakyDestination::new(FailureMode::AlwaysFail);
    let mut config = test_pipeline_config(5);
    config.worker_count = Some(1);
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());
    pipeline.start().await.unwrap();

    let table = TableName::from("students_dropped");
    let producer = pipeline.producer();
    for _ in 0..10 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    let snapshot = pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(snapshot.enqueued, 10);
    assert_eq!(snapshot.persisted, 0);
    assert_eq!(snapshot.dropped, 10);
    assert_eq!(snapshot.enqueued, snapshot.persisted + snapshot.dropped);
    assert_eq!(destination.inner().total_records().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_failures_trip_the_circuit_breaker() {
    init_test_tracing();

    let destination = FlakyDestination::new(FailureMode::AlwaysFail);
    let mut config = test_pipeline_config(6);
    config.worker_count = Some(1);
    config.max_consecutive_errors = 1;
    config.write_retry.max_attempts = 1;
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());
    pipeline.start().await.unwrap();

    let table = TableName::from("students_breaker");
    let producer = pipeline.producer();
    for _ in 0..10 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    let err = pipeline.shutdown_and_wait().await.unwrap_err();
    assert!(err.kinds().contains(&ErrorKind::CircuitBreakerOpen));
}

#[tokio::test(flavor = "multi_thread")]
async fn circuit_breaker_stops_producers() {
    init_test_tracing();

    let destination = FlakyDestination::new(FailureMode::AlwaysFail);
    let mut config = test_pipeline_config(7);
    config.worker_count = Some(1);
    config.max_consecutive_errors = 1;
    config.write_retry.max_attempts = 1;
    config.batch.max_fill_ms = 10;
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());
    pipeline.start().await.unwrap();

    let table = TableName::from("students_fatal");
    let producer = pipeline.producer();
    for _ in 0..10 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    // Give the worker time to fail and raise the fatal signal, which closes
    // the queue to producers.
    let mut rejected = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Err(err) = producer.enqueue(test_record(&table)).await {
            assert_eq!(err.kind(), ErrorKind::QueueClosed);
            rejected = true;
            break;
        }
    }
    assert!(rejected, "queue should close after the breaker trips");

    let _ = pipeline.shutdown_and_wait().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_timeout_abandons_in_flight_records() {
    init_test_tracing();

    let mut config = test_pipeline_config(8);
    config.worker_count = Some(1);
    config.shutdown_timeout_ms = 200;
    config.batch.max_fill_ms = 10;
    let mut pipeline = Pipeline::new(config, &profile(), HangingDestination);
    pipeline.start().await.unwrap();

    let table = TableName::from("students_hanging");
    let producer = pipeline.producer();
    let stats = pipeline.stats();
    for _ in 0..30 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    let err = pipeline.shutdown_and_wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShutdownTimeout);

    // Abandoned records still settle the accounting.
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.enqueued, 30);
    assert_eq!(snapshot.dropped, 30);
    assert_eq!(snapshot.in_flight, 0);
}

// The blocking write must not starve the timer driver, so this test needs a
// second runtime thread even on single-core machines.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn writes_finishing_after_the_timeout_are_not_double_counted() {
    init_test_tracing();

    // The write outlives the shutdown timeout but cannot be interrupted, so
    // it lands after the abort. The accounting must wait for it to settle
    // instead of also counting those records as dropped.
    let destination = BlockingDestination::new(Duration::from_millis(400));
    let mut config = test_pipeline_config(10);
    config.worker_count = Some(1);
    config.batch.max_size = 10;
    config.batch.max_fill_ms = 60_000;
    config.shutdown_timeout_ms = 100;
    let mut pipeline = Pipeline::new(config, &profile(), destination.clone());

    let table = TableName::from("students_slow");
    let producer = pipeline.producer();
    let stats = pipeline.stats();
    for _ in 0..10 {
        producer.enqueue(test_record(&table)).await.unwrap();
    }

    pipeline.start().await.unwrap();
    let err = pipeline.shutdown_and_wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShutdownTimeout);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.enqueued, 10);
    assert_eq!(snapshot.enqueued, snapshot.persisted + snapshot.dropped);
    assert_eq!(snapshot.in_flight, 0);
}
