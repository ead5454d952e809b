use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, RetryConfig, ValidationError};

/// Capacities for the per-domain uniqueness caches and the bound on
/// generate-check-retry attempts.
///
/// A cache only avoids collisions within its recency horizon: once a value is
/// evicted it may be re-emitted and rejected by a storage-level uniqueness
/// constraint. Operators who need a wider horizon should raise the capacity
/// towards the expected total cardinality of the domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Capacity of the phone-number cache.
    #[serde(default = "default_phone_capacity")]
    pub phone_capacity: usize,
    /// Capacity of the national-id cache.
    #[serde(default = "default_national_id_capacity")]
    pub national_id_capacity: usize,
    /// Capacity of the full-name pair cache.
    #[serde(default = "default_name_pair_capacity")]
    pub name_pair_capacity: usize,
    /// Maximum generate-check-retry attempts before a uniqueness domain is
    /// considered exhausted.
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
}

impl CacheConfig {
    pub const DEFAULT_PHONE_CAPACITY: usize = 1_000_000;
    pub const DEFAULT_NATIONAL_ID_CAPACITY: usize = 1_000_000;
    // Smaller than the full-name combination space, so eviction keeps fresh
    // name pairs available on long runs.
    pub const DEFAULT_NAME_PAIR_CAPACITY: usize = 20_000;
    pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 1000;

    /// Validates cache configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, capacity) in [
            ("caches.phone_capacity", self.phone_capacity),
            ("caches.national_id_capacity", self.national_id_capacity),
            ("caches.name_pair_capacity", self.name_pair_capacity),
        ] {
            if capacity == 0 {
                return Err(ValidationError::invalid(field, "must be greater than 0"));
            }
        }

        if self.max_generation_attempts == 0 {
            return Err(ValidationError::invalid(
                "caches.max_generation_attempts",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            phone_capacity: default_phone_capacity(),
            national_id_capacity: default_national_id_capacity(),
            name_pair_capacity: default_name_pair_capacity(),
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

/// Host-memory watermarks sampled by the progress monitor.
///
/// Crossing the high watermark logs a warning; crossing the critical watermark
/// escalates the log level. Neither aborts the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryPressureConfig {
    /// Fraction of total memory above which a warning is emitted, in `[0.0, 1.0]`.
    #[serde(default = "default_high_watermark")]
    pub high_watermark: f32,
    /// Fraction of total memory above which pressure is surfaced as an error, in `[0.0, 1.0]`.
    #[serde(default = "default_critical_watermark")]
    pub critical_watermark: f32,
}

impl MemoryPressureConfig {
    pub const DEFAULT_HIGH_WATERMARK: f32 = 0.80;
    pub const DEFAULT_CRITICAL_WATERMARK: f32 = 0.92;

    /// Validates memory watermark settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.high_watermark) {
            return Err(ValidationError::invalid(
                "memory.high_watermark",
                "must be between 0.0 and 1.0",
            ));
        }

        if self.critical_watermark < self.high_watermark || self.critical_watermark > 1.0 {
            return Err(ValidationError::invalid(
                "memory.critical_watermark",
                "must be between high_watermark and 1.0",
            ));
        }

        Ok(())
    }
}

impl Default for MemoryPressureConfig {
    fn default() -> Self {
        Self {
            high_watermark: default_high_watermark(),
            critical_watermark: default_critical_watermark(),
        }
    }
}

/// Configuration for an ingestion pipeline.
///
/// Contains all settings required to run the generation-to-storage pipeline:
/// queue capacity, batching, retry behavior, worker sizing, caches, and
/// shutdown bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// The unique identifier for this pipeline, used as a metrics label.
    pub id: u64,
    /// Capacity of the bounded ingestion queue. Producers block when full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Overrides the hardware-derived worker count when set.
    #[serde(default)]
    pub worker_count: Option<usize>,
    /// Batch assembly configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Retry behavior for batch writes.
    #[serde(default)]
    pub write_retry: RetryConfig,
    /// Number of consecutively failed batches after which a consumer stops
    /// accepting input and surfaces a fatal error.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Overall bound on draining at shutdown, in milliseconds. Work still in
    /// flight when it elapses is abandoned and counted as dropped.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// Interval between progress samples, in milliseconds.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Uniqueness cache sizing.
    #[serde(default)]
    pub caches: CacheConfig,
    /// Host memory watermarks.
    #[serde(default)]
    pub memory: MemoryPressureConfig,
}

impl PipelineConfig {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
    pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 10;
    pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 60_000;
    pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 2_000;

    /// Returns the shutdown timeout as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Returns the batch fill bound as a [`Duration`].
    pub fn batch_max_fill(&self) -> Duration {
        Duration::from_millis(self.batch.max_fill_ms)
    }

    /// Returns the progress sampling interval as a [`Duration`].
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.batch.validate()?;
        self.write_retry.validate()?;
        self.caches.validate()?;
        self.memory.validate()?;

        if self.queue_capacity == 0 {
            return Err(ValidationError::invalid(
                "queue_capacity",
                "must be greater than 0",
            ));
        }

        if self.worker_count == Some(0) {
            return Err(ValidationError::invalid(
                "worker_count",
                "must be greater than 0 when set",
            ));
        }

        if self.max_consecutive_errors == 0 {
            return Err(ValidationError::invalid(
                "max_consecutive_errors",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn default_queue_capacity() -> usize {
    PipelineConfig::DEFAULT_QUEUE_CAPACITY
}

fn default_max_consecutive_errors() -> u32 {
    PipelineConfig::DEFAULT_MAX_CONSECUTIVE_ERRORS
}

fn default_shutdown_timeout_ms() -> u64 {
    PipelineConfig::DEFAULT_SHUTDOWN_TIMEOUT_MS
}

fn default_progress_interval_ms() -> u64 {
    PipelineConfig::DEFAULT_PROGRESS_INTERVAL_MS
}

fn default_phone_capacity() -> usize {
    CacheConfig::DEFAULT_PHONE_CAPACITY
}

fn default_national_id_capacity() -> usize {
    CacheConfig::DEFAULT_NATIONAL_ID_CAPACITY
}

fn default_name_pair_capacity() -> usize {
    CacheConfig::DEFAULT_NAME_PAIR_CAPACITY
}

fn default_max_generation_attempts() -> u32 {
    CacheConfig::DEFAULT_MAX_GENERATION_ATTEMPTS
}

fn default_high_watermark() -> f32 {
    MemoryPressureConfig::DEFAULT_HIGH_WATERMARK
}

fn default_critical_watermark() -> f32 {
    MemoryPressureConfig::DEFAULT_CRITICAL_WATERMARK
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> PipelineConfig {
        PipelineConfig {
            id: 1,
            queue_capacity: PipelineConfig::DEFAULT_QUEUE_CAPACITY,
            worker_count: None,
            batch: BatchConfig::default(),
            write_retry: RetryConfig::default(),
            max_consecutive_errors: PipelineConfig::DEFAULT_MAX_CONSECUTIVE_ERRORS,
            shutdown_timeout_ms: PipelineConfig::DEFAULT_SHUTDOWN_TIMEOUT_MS,
            progress_interval_ms: PipelineConfig::DEFAULT_PROGRESS_INTERVAL_MS,
            caches: CacheConfig::default(),
            memory: MemoryPressureConfig::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let mut config = base_config();
        config.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_zero_worker_count_is_rejected() {
        let mut config = base_config();
        config.worker_count = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_memory_watermarks_are_rejected() {
        let mut config = base_config();
        config.memory.high_watermark = 0.9;
        config.memory.critical_watermark = 0.5;
        assert!(config.validate().is_err());
    }
}
