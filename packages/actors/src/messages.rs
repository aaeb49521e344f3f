//! Message types for actor communication.

use ractor::{ActorRef, RpcReplyPort};
use scheduler_core::{JobEnvelope, JobId, PoolStats, ResultEnvelope, WorkerRequest};
use serde_json::Value;

use crate::error::PoolError;

/// What a caller eventually receives for a submitted job.
pub type JobOutcome = Result<Value, PoolError>;

/// Messages for the PoolActor.
#[derive(Debug)]
pub enum PoolMessage {
    /// Submit a job.
    Execute {
        request: WorkerRequest,
        reply: RpcReplyPort<JobOutcome>,
    },

    /// A worker answered a job.
    WorkerReply {
        worker: usize,
        envelope: ResultEnvelope,
    },

    /// A worker faulted while running a job.
    WorkerFault {
        worker: usize,
        job_id: JobId,
        detail: String,
    },

    /// Get pool stats.
    GetStats { reply: RpcReplyPort<PoolStats> },

    /// Look up the actor in a worker slot.
    GetWorker {
        index: usize,
        reply: RpcReplyPort<Option<ActorRef<WorkerMessage>>>,
    },

    /// Reject all outstanding jobs, stop every worker and stop the pool.
    Terminate,
}

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Run a job and report back to the pool.
    Run { envelope: JobEnvelope },
}
