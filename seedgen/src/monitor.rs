//! Periodic progress and memory reporting for a running pipeline.
//!
//! A single background task samples the shared stats on a fixed interval,
//! logs throughput, warns when the pipeline appears stalled, and watches
//! host memory usage against the configured watermarks.

use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use sysinfo::{MemoryRefreshKind, System};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use schoolseed_config::shared::MemoryPressureConfig;

use crate::concurrency::shutdown::{PhaseRx, PipelinePhase};
use crate::metrics::{PIPELINE_ID_LABEL, SEED_MEMORY_USED_PERCENT};
use crate::stats::{PipelineStats, StatsSnapshot};

/// Consecutive no-progress samples with records still in flight before a
/// stall warning is emitted.
const STALL_SAMPLES: u32 = 3;

/// Spawns the progress monitor task.
///
/// The task exits on its own once the pipeline reaches
/// [`PipelinePhase::Terminated`].
pub fn spawn_progress_monitor(
    stats: Arc<PipelineStats>,
    interval: Duration,
    memory: MemoryPressureConfig,
    mut phase_rx: PhaseRx,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut system = System::new();
        let mut previous = stats.snapshot();
        let mut stalled_samples = 0u32;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = phase_rx.changed() => {
                    if changed.is_err() || *phase_rx.borrow() == PipelinePhase::Terminated {
                        break;
                    }
                    continue;
                }
            }

            let snapshot = stats.snapshot();
            report_progress(&stats, interval, previous, snapshot);

            stalled_samples = if is_stalled(previous, snapshot) {
                stalled_samples + 1
            } else {
                0
            };
            if stalled_samples >= STALL_SAMPLES {
                warn!(
                    in_flight = snapshot.in_flight,
                    samples = stalled_samples,
                    "pipeline appears stalled, records in flight but none completing"
                );
            }

            report_memory(&stats, &mut system, &memory);

            previous = snapshot;
        }
    })
}

fn report_progress(
    stats: &PipelineStats,
    interval: Duration,
    previous: StatsSnapshot,
    snapshot: StatsSnapshot,
) {
    let persisted_delta = snapshot.persisted.saturating_sub(previous.persisted);
    let throughput = persisted_delta as f64 / interval.as_secs_f64();

    info!(
        pipeline_id = stats.pipeline_id(),
        enqueued = snapshot.enqueued,
        persisted = snapshot.persisted,
        dropped = snapshot.dropped,
        in_flight = snapshot.in_flight,
        records_per_sec = format!("{throughput:.0}"),
        "pipeline progress"
    );
}

fn is_stalled(previous: StatsSnapshot, snapshot: StatsSnapshot) -> bool {
    let completed = snapshot.persisted + snapshot.dropped;
    let previously_completed = previous.persisted + previous.dropped;
    snapshot.in_flight > 0 && completed == previously_completed
}

fn report_memory(stats: &PipelineStats, system: &mut System, memory: &MemoryPressureConfig) {
    system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

    let total = system.total_memory();
    if total == 0 {
        return;
    }
    let used_percent = system.used_memory() as f32 / total as f32;

    gauge!(SEED_MEMORY_USED_PERCENT, PIPELINE_ID_LABEL => stats.pipeline_id().to_string())
        .set(f64::from(used_percent));

    if used_percent >= memory.critical_watermark {
        error!(
            used_percent = format!("{:.1}", used_percent * 100.0),
            "host memory usage is critical"
        );
    } else if used_percent >= memory.high_watermark {
        warn!(
            used_percent = format!("{:.1}", used_percent * 100.0),
            "host memory usage is high"
        );
    }
}
