use std::{sync::Mutex, time::Duration};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

// Global cache for the Prometheus handle used by [`init_metrics_handle`].
//
// A [`Mutex`] is used instead of [`Once`] or [`OnceLock`] because the
// initialization code is fallible and `OnceLock::get_or_try_init` is still
// unstable. [`PrometheusBuilder::install_recorder`] installs a global metrics
// recorder and any later call to it fails, so the handle must be created once
// and shared; tests in particular initialize telemetry repeatedly.
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Interval between metrics upkeep passes.
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Installs the Prometheus recorder and returns a handle for rendering.
///
/// The caller decides how to expose the rendered text (log it, serve it, or
/// write it to a file at the end of a run). Initialization happens only once;
/// subsequent calls return cloned handles from the cache.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE.lock().unwrap();

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    let handle_clone = handle.clone();

    // Periodic upkeep avoids unbounded memory growth in the recorder.
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(UPKEEP_INTERVAL).await;
            trace!("running metrics upkeep");
            handle_clone.run_upkeep();
        }
    });

    Ok(handle)
}
