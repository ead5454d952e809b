//! School seeder service binary.
//!
//! Loads configuration, initializes telemetry and runs the generation
//! pipeline that bulk-inserts synthetic school and student records into the
//! configured destination.

use schoolseed_telemetry::metrics::init_metrics_handle;
use schoolseed_telemetry::tracing::init_tracing;
use tracing::error;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let seeder_config = config::load_seeder_config()?;

    init_tracing();

    // The metrics recorder spawns its upkeep task, so it initializes inside
    // the runtime.
    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            init_metrics_handle()?;
            core::start_seeder_with_config(seeder_config).await
        });

    if let Err(err) = outcome {
        error!("seeder failed: {err:#}");
        std::process::exit(1);
    }

    Ok(())
}
