//! Errors surfaced to callers of the worker pool.

use scheduler_core::env::EnvError;

/// Why a submitted job did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The worker answered with an error response.
    #[error("{0}")]
    JobFailed(String),

    /// The worker faulted while processing the job. The detail is kept for
    /// logs; callers see a generic message.
    #[error("Worker error")]
    WorkerFault { detail: String },

    #[error("worker pool has been terminated")]
    Terminated,

    #[error("worker pool queue is full ({limit} jobs waiting)")]
    QueueFull { limit: usize },

    #[error("unexpected result shape: {0}")]
    InvalidResult(String),

    #[error("failed to spawn actor: {0}")]
    Spawn(String),
}

/// Invalid pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}
