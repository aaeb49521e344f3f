//! Worker pool configuration.

use scheduler_core::env::parse_var;

use crate::error::ConfigError;

/// Upper bound on workers regardless of the hardware hint.
pub const MAX_WORKERS_CAP: usize = 4;

/// Default capacity of the pool event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Configuration for a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of workers, between 1 and [`MAX_WORKERS_CAP`].
    pub max_workers: usize,
    /// Maximum number of jobs waiting for a worker. `None` is unbounded.
    pub max_queued: Option<usize>,
    /// Buffer size of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: hardware_concurrency_hint().min(MAX_WORKERS_CAP),
            max_queued: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Set the worker bound. Clamped to `1..=MAX_WORKERS_CAP`.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.clamp(1, MAX_WORKERS_CAP);
        self
    }

    /// Bound the wait queue.
    pub fn with_max_queued(mut self, max_queued: usize) -> Self {
        self.max_queued = Some(max_queued);
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Build a config from environment variables, falling back to defaults.
    ///
    /// - `WORKER_POOL_MAX_WORKERS` (clamped to `1..=4`)
    /// - `WORKER_POOL_MAX_QUEUED` (unset means unbounded)
    /// - `WORKER_POOL_EVENT_CAPACITY` (default: 1024)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(max_workers) = parse_var::<usize>("WORKER_POOL_MAX_WORKERS")? {
            if max_workers == 0 {
                return Err(ConfigError::Zero("WORKER_POOL_MAX_WORKERS"));
            }
            config = config.with_max_workers(max_workers);
        }
        if let Some(max_queued) = parse_var::<usize>("WORKER_POOL_MAX_QUEUED")? {
            config = config.with_max_queued(max_queued);
        }
        if let Some(capacity) = parse_var::<usize>("WORKER_POOL_EVENT_CAPACITY")? {
            if capacity == 0 {
                return Err(ConfigError::Zero("WORKER_POOL_EVENT_CAPACITY"));
            }
            config = config.with_event_capacity(capacity);
        }

        Ok(config)
    }
}

/// Number of hardware threads, or the cap when unknown.
pub fn hardware_concurrency_hint() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MAX_WORKERS_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_respects_cap() {
        let config = PoolConfig::default();
        assert!(config.max_workers >= 1);
        assert!(config.max_workers <= MAX_WORKERS_CAP);
        assert_eq!(config.max_queued, None);
    }

    #[test]
    fn max_workers_is_clamped() {
        assert_eq!(PoolConfig::default().with_max_workers(0).max_workers, 1);
        assert_eq!(PoolConfig::default().with_max_workers(64).max_workers, 4);
        assert_eq!(PoolConfig::default().with_max_workers(2).max_workers, 2);
    }
}
