//! Worker actor for executing jobs.

use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use scheduler_core::{JobEnvelope, ResultEnvelope};

use crate::handler::TaskRegistry;
use crate::messages::{PoolMessage, WorkerMessage};

/// State for the worker actor.
pub struct WorkerActorState {
    /// Slot index in the pool.
    pub index: usize,
    /// Jobs processed since start.
    pub processed: u64,
    /// Pool actor reference.
    pub pool: ActorRef<PoolMessage>,
    /// Handler registry.
    pub handlers: Arc<TaskRegistry>,
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub index: usize,
    pub pool: ActorRef<PoolMessage>,
    pub handlers: Arc<TaskRegistry>,
}

/// Worker actor that runs one job at a time.
///
/// The calculation itself runs on the blocking thread pool so several
/// workers compute in parallel. A panic inside a handler is caught there
/// and reported as a fault; the worker stays alive for the next job.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!("Starting worker: {}", args.index);

        Ok(WorkerActorState {
            index: args.index,
            processed: 0,
            pool: args.pool,
            handlers: args.handlers,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Run { envelope } => {
                let JobEnvelope { job_id, request } = envelope;

                let handlers = state.handlers.clone();
                let outcome = tokio::task::spawn_blocking(move || handlers.run(request)).await;

                state.processed += 1;

                let report = match outcome {
                    Ok(response) => PoolMessage::WorkerReply {
                        worker: state.index,
                        envelope: ResultEnvelope { job_id, response },
                    },
                    Err(e) => {
                        tracing::warn!("Worker {} faulted on job {}: {}", state.index, job_id, e);
                        PoolMessage::WorkerFault {
                            worker: state.index,
                            job_id,
                            detail: e.to_string(),
                        }
                    }
                };

                if state.pool.send_message(report).is_err() {
                    tracing::debug!("Pool gone, stopping worker {}", state.index);
                    myself.stop(None);
                }
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::debug!(
            "Worker {} stopped after {} jobs",
            state.index,
            state.processed
        );
        Ok(())
    }
}
