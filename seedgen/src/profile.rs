//! Host resource introspection and pool sizing.
//!
//! Sampled once at startup; the pipeline sizes its worker pool and connection
//! pool from this profile so that throughput scales with the machine without
//! per-host configuration.

use sysinfo::{MemoryRefreshKind, System};

use crate::error::{ErrorKind, SeedError, SeedResult};

const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 50;
const MIN_CONNECTIONS: u32 = 10;
const CONNECTION_HEADROOM: u32 = 5;
const MIN_IDLE_CONNECTIONS: u32 = 2;

/// A snapshot of the host's compute and memory capacity, taken at startup.
#[derive(Debug, Clone, Copy)]
pub struct ResourceProfile {
    pub cpu_cores: usize,
    pub total_memory_bytes: u64,
}

impl ResourceProfile {
    /// Probes the host for core count and physical memory.
    pub fn detect() -> SeedResult<Self> {
        let cpu_cores = std::thread::available_parallelism()
            .map_err(|err| {
                SeedError::from((
                    ErrorKind::HostIntrospectionFailed,
                    "Failed to determine available parallelism",
                ))
                .with_source(err)
            })?
            .get();

        let mut system = System::new();
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        Ok(Self {
            cpu_cores,
            total_memory_bytes: system.total_memory(),
        })
    }

    /// Number of batch assembler workers: twice the core count, clamped to
    /// `[2, 50]`.
    ///
    /// The workers are I/O bound on destination writes, so oversubscribing
    /// cores pays off; the upper clamp keeps connection demand sane on very
    /// large hosts.
    pub fn worker_count(&self) -> usize {
        (self.cpu_cores * 2).clamp(MIN_WORKERS, MAX_WORKERS)
    }

    /// Connection pool ceiling: one connection per worker plus headroom for
    /// the monitor and setup queries, never below 10.
    pub fn max_connections(&self) -> u32 {
        (self.worker_count() as u32 + CONNECTION_HEADROOM).max(MIN_CONNECTIONS)
    }

    /// Connections kept warm between bursts.
    pub fn min_idle_connections(&self) -> u32 {
        (self.worker_count() as u32 / 4).max(MIN_IDLE_CONNECTIONS)
    }
}
