//! Prefetch scheduler configuration.

use std::time::Duration;

use scheduler_core::Priority;
use scheduler_core::env::parse_var;

use crate::error::ConfigError;

/// Default number of routes loaded concurrently by a batch.
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Default wait for an idle signal before critical routes load anyway.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Debounce delay per priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceDelays {
    pub critical: Duration,
    pub high: Duration,
    pub medium: Duration,
    pub low: Duration,
}

impl Default for DebounceDelays {
    fn default() -> Self {
        Self {
            critical: Duration::ZERO,
            high: Duration::from_millis(100),
            medium: Duration::from_millis(200),
            low: Duration::from_millis(300),
        }
    }
}

impl DebounceDelays {
    pub fn for_priority(&self, priority: Priority) -> Duration {
        match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// Same delay for every priority.
    pub fn uniform(delay: Duration) -> Self {
        Self {
            critical: delay,
            high: delay,
            medium: delay,
            low: delay,
        }
    }
}

/// Configuration for a [`PrefetchScheduler`](crate::PrefetchScheduler).
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchConfig {
    /// Routes loaded concurrently by `prefetch_batch`.
    pub batch_size: usize,
    /// Fallback wait in `prefetch_critical_on_idle`.
    pub idle_timeout: Duration,
    pub delays: DebounceDelays,
    /// Devices reporting less memory than this (GB) only load essential routes.
    pub low_memory_gb: f64,
    /// Connections reporting less downlink than this (Mbps) only load
    /// essential routes.
    pub min_downlink_mbps: f64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            delays: DebounceDelays::default(),
            low_memory_gb: 2.0,
            min_downlink_mbps: 1.0,
        }
    }
}

impl PrefetchConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_delays(mut self, delays: DebounceDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_low_memory_gb(mut self, gb: f64) -> Self {
        self.low_memory_gb = gb;
        self
    }

    pub fn with_min_downlink_mbps(mut self, mbps: f64) -> Self {
        self.min_downlink_mbps = mbps;
        self
    }

    /// Build a config from environment variables, falling back to defaults.
    ///
    /// - `PREFETCH_BATCH_SIZE` (default: 3)
    /// - `PREFETCH_IDLE_TIMEOUT_MS` (default: 2000)
    /// - `PREFETCH_DELAY_CRITICAL_MS`, `PREFETCH_DELAY_HIGH_MS`,
    ///   `PREFETCH_DELAY_MEDIUM_MS`, `PREFETCH_DELAY_LOW_MS`
    ///   (defaults: 0, 100, 200, 300)
    /// - `PREFETCH_LOW_MEMORY_GB` (default: 2)
    /// - `PREFETCH_MIN_DOWNLINK_MBPS` (default: 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(batch_size) = parse_var::<usize>("PREFETCH_BATCH_SIZE")? {
            if batch_size == 0 {
                return Err(ConfigError::Zero("PREFETCH_BATCH_SIZE"));
            }
            config.batch_size = batch_size;
        }
        if let Some(ms) = parse_var::<u64>("PREFETCH_IDLE_TIMEOUT_MS")? {
            config.idle_timeout = Duration::from_millis(ms);
        }

        let delays = &mut config.delays;
        for (var, slot) in [
            ("PREFETCH_DELAY_CRITICAL_MS", &mut delays.critical),
            ("PREFETCH_DELAY_HIGH_MS", &mut delays.high),
            ("PREFETCH_DELAY_MEDIUM_MS", &mut delays.medium),
            ("PREFETCH_DELAY_LOW_MS", &mut delays.low),
        ] {
            if let Some(ms) = parse_var::<u64>(var)? {
                *slot = Duration::from_millis(ms);
            }
        }

        if let Some(gb) = parse_var::<f64>("PREFETCH_LOW_MEMORY_GB")? {
            config.low_memory_gb = non_negative("PREFETCH_LOW_MEMORY_GB", gb)?;
        }
        if let Some(mbps) = parse_var::<f64>("PREFETCH_MIN_DOWNLINK_MBPS")? {
            config.min_downlink_mbps = non_negative("PREFETCH_MIN_DOWNLINK_MBPS", mbps)?;
        }

        Ok(config)
    }
}

fn non_negative(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { var, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_follow_priority() {
        let delays = DebounceDelays::default();
        let ordered: Vec<Duration> = Priority::ALL
            .iter()
            .map(|p| delays.for_priority(*p))
            .collect();
        assert_eq!(
            ordered,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300),
            ]
        );
    }

    #[test]
    fn batch_size_is_at_least_one() {
        assert_eq!(PrefetchConfig::default().with_batch_size(0).batch_size, 1);
        assert_eq!(PrefetchConfig::default().batch_size, 3);
    }

    #[test]
    fn rejects_negative_thresholds() {
        assert!(non_negative("X", -1.0).is_err());
        assert!(non_negative("X", f64::NAN).is_err());
        assert_eq!(non_negative("X", 0.5), Ok(0.5));
    }
}
