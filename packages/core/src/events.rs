//! Event types for observing the worker pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, TaskKind};

/// Events emitted by a worker pool as jobs move through their lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A worker was created.
    WorkerSpawned {
        worker: usize,
        timestamp: DateTime<Utc>,
    },
    /// A job was accepted and is waiting for a worker.
    JobQueued {
        job_id: JobId,
        kind: TaskKind,
        queue_depth: usize,
        timestamp: DateTime<Utc>,
    },
    /// A job was bound to a worker.
    JobDispatched {
        job_id: JobId,
        worker: usize,
        timestamp: DateTime<Utc>,
    },
    /// A job resolved with a result.
    JobSucceeded {
        job_id: JobId,
        worker: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A job was rejected.
    JobFailed {
        job_id: JobId,
        worker: Option<usize>,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The pool was torn down.
    PoolTerminated {
        rejected: usize,
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Job this event refers to, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            PoolEvent::JobQueued { job_id, .. }
            | PoolEvent::JobDispatched { job_id, .. }
            | PoolEvent::JobSucceeded { job_id, .. }
            | PoolEvent::JobFailed { job_id, .. } => Some(*job_id),
            PoolEvent::WorkerSpawned { .. } | PoolEvent::PoolTerminated { .. } => None,
        }
    }

    /// Whether this event settles a job.
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            PoolEvent::JobSucceeded { .. } | PoolEvent::JobFailed { .. }
        )
    }
}
