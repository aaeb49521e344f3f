//! Prefetch errors.

use scheduler_core::env::EnvError;

/// Why a route was not warmed up.
///
/// These are logged by the prefetch actor and never reach callers of the
/// scheduling operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefetchError {
    #[error("no loader registered for route {0}")]
    NoLoader(String),

    #[error("failed to load {route}: {reason}")]
    LoadFailed { route: String, reason: String },

    #[error("prefetcher has been stopped")]
    Stopped,

    #[error("failed to spawn actor: {0}")]
    Spawn(String),
}

impl PrefetchError {
    pub fn load_failed(route: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            route: route.into(),
            reason: reason.to_string(),
        }
    }
}

/// Invalid prefetch configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("{var} must be a non-negative number, got {value}")]
    Negative { var: &'static str, value: f64 },
}
