//! Pool actor: owns the workers and runs the dispatch loop.

use std::sync::Arc;

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, SupervisionEvent};
use scheduler_core::{JobEnvelope, JobId, PoolEvent, WorkerResponse};
use tokio::sync::broadcast;

use crate::config::PoolConfig;
use crate::dispatch::Dispatcher;
use crate::error::PoolError;
use crate::handler::TaskRegistry;
use crate::messages::{PoolMessage, WorkerMessage};
use crate::worker_actor::{WorkerActor, WorkerArgs};

type Reply = ractor::RpcReplyPort<crate::messages::JobOutcome>;

/// State for the pool actor.
pub struct PoolActorState {
    dispatcher: Dispatcher<Reply>,
    /// Worker actors, indexed like the dispatcher's slots.
    workers: Vec<ActorRef<WorkerMessage>>,
    handlers: Arc<TaskRegistry>,
    event_tx: broadcast::Sender<PoolEvent>,
    terminating: bool,
}

impl PoolActorState {
    /// Create a new pool actor state.
    pub fn new(
        config: &PoolConfig,
        handlers: Arc<TaskRegistry>,
        event_tx: broadcast::Sender<PoolEvent>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.max_workers, config.max_queued),
            workers: Vec::new(),
            handlers,
            event_tx,
            terminating: false,
        }
    }

    /// Broadcast an event. Having no subscribers is fine.
    fn broadcast(&self, event: PoolEvent) {
        let _ = self.event_tx.send(event);
    }

    fn reject(&self, job_id: JobId, worker: Option<usize>, reply: Reply, error: PoolError) {
        self.broadcast(PoolEvent::JobFailed {
            job_id,
            worker,
            error: error.to_string(),
            timestamp: Utc::now(),
        });
        let _ = reply.send(Err(error));
    }

    fn settle(&mut self, job_id: JobId, response: Result<WorkerResponse, PoolError>) {
        let Some(settled) = self.dispatcher.settle(job_id) else {
            tracing::debug!("Ignoring response for unknown job {}", job_id);
            return;
        };

        match response {
            Ok(WorkerResponse::Success { data }) => {
                tracing::debug!(
                    "Job {} succeeded on worker {} in {:?}",
                    job_id,
                    settled.worker,
                    settled.elapsed
                );
                self.broadcast(PoolEvent::JobSucceeded {
                    job_id,
                    worker: settled.worker,
                    duration_ms: settled.elapsed.as_millis() as u64,
                    timestamp: Utc::now(),
                });
                let _ = settled.reply.send(Ok(data));
            }
            Ok(WorkerResponse::Error { error }) => {
                tracing::debug!("Job {} failed: {}", job_id, error);
                self.reject(
                    job_id,
                    Some(settled.worker),
                    settled.reply,
                    PoolError::JobFailed(error),
                );
            }
            Err(error) => {
                self.reject(job_id, Some(settled.worker), settled.reply, error);
            }
        }
    }
}

async fn spawn_worker(
    myself: &ActorRef<PoolMessage>,
    handlers: Arc<TaskRegistry>,
    index: usize,
) -> Result<ActorRef<WorkerMessage>, PoolError> {
    let args = WorkerArgs {
        index,
        pool: myself.clone(),
        handlers,
    };

    let (worker, _handle) = Actor::spawn_linked(None, WorkerActor, args, myself.get_cell())
        .await
        .map_err(|e| PoolError::Spawn(e.to_string()))?;

    Ok(worker)
}

/// Bind queued jobs to workers until the queue is empty or every worker is
/// busy. Never waits on a job.
async fn dispatch(myself: &ActorRef<PoolMessage>, state: &mut PoolActorState) {
    while let Some(binding) = state.dispatcher.next_binding() {
        if binding.spawn {
            match spawn_worker(myself, state.handlers.clone(), binding.worker).await {
                Ok(worker) => {
                    tracing::info!("Spawned worker {}", binding.worker);
                    state.workers.push(worker);
                    state.broadcast(PoolEvent::WorkerSpawned {
                        worker: binding.worker,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to spawn worker {}: {}", binding.worker, e);
                    if let Some((job_id, reply)) = state.dispatcher.abandon_spawn(binding.worker) {
                        state.reject(job_id, None, reply, e);
                    }
                    continue;
                }
            }
        }

        let job_id = binding.job_id;
        let envelope = JobEnvelope {
            job_id,
            request: binding.request,
        };

        if let Err(e) = post(myself, state, binding.worker, envelope).await {
            state.settle(job_id, Err(e));
            continue;
        }

        tracing::debug!("Dispatched job {} to worker {}", job_id, binding.worker);
        state.broadcast(PoolEvent::JobDispatched {
            job_id,
            worker: binding.worker,
            timestamp: Utc::now(),
        });
    }
}

/// Post a job to a worker, replacing the worker's actor once if it is gone.
async fn post(
    myself: &ActorRef<PoolMessage>,
    state: &mut PoolActorState,
    index: usize,
    envelope: JobEnvelope,
) -> Result<(), PoolError> {
    let worker = state
        .workers
        .get(index)
        .ok_or_else(|| PoolError::Spawn(format!("no worker in slot {index}")))?;

    let Err(err) = worker.send_message(WorkerMessage::Run { envelope }) else {
        return Ok(());
    };

    let envelope = match err {
        ractor::MessagingErr::SendErr(WorkerMessage::Run { envelope }) => envelope,
        other => {
            return Err(PoolError::WorkerFault {
                detail: other.to_string(),
            });
        }
    };

    tracing::warn!("Worker {} unreachable, replacing it", index);
    let replacement = spawn_worker(myself, state.handlers.clone(), index).await?;
    state.workers[index] = replacement.clone();
    replacement
        .send_message(WorkerMessage::Run { envelope })
        .map_err(|e| PoolError::WorkerFault {
            detail: e.to_string(),
        })
}

/// Pool actor that serializes every scheduling decision for one pool.
pub struct PoolActor;

impl Actor for PoolActor {
    type Msg = PoolMessage;
    type State = PoolActorState;
    type Arguments = PoolActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting worker pool (max {} workers)",
            args.dispatcher.max_workers()
        );
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PoolMessage::Execute { request, reply } => {
                let job_id = JobId::new();

                if state.terminating {
                    state.reject(job_id, None, reply, PoolError::Terminated);
                    return Ok(());
                }

                let kind = request.kind.clone();
                match state.dispatcher.submit(job_id, request, reply) {
                    Ok(queue_depth) => {
                        tracing::debug!("Queued {} job {} (depth {})", kind, job_id, queue_depth);
                        state.broadcast(PoolEvent::JobQueued {
                            job_id,
                            kind,
                            queue_depth,
                            timestamp: Utc::now(),
                        });
                        dispatch(&myself, state).await;
                    }
                    Err(reply) => {
                        let limit = state.dispatcher.max_queued().unwrap_or_default();
                        tracing::warn!("Rejecting {} job {}: queue full", kind, job_id);
                        state.reject(job_id, None, reply, PoolError::QueueFull { limit });
                    }
                }
            }

            PoolMessage::WorkerReply { worker, envelope } => {
                if state.dispatcher.job_on(worker) != Some(envelope.job_id) {
                    tracing::warn!(
                        "Worker {} answered job {} it does not hold",
                        worker,
                        envelope.job_id
                    );
                }
                state.settle(envelope.job_id, Ok(envelope.response));
                dispatch(&myself, state).await;
            }

            PoolMessage::WorkerFault {
                worker,
                job_id,
                detail,
            } => {
                tracing::warn!("Worker {} fault on job {}: {}", worker, job_id, detail);
                state.settle(job_id, Err(PoolError::WorkerFault { detail }));
                dispatch(&myself, state).await;
            }

            PoolMessage::GetStats { reply } => {
                let _ = reply.send(state.dispatcher.stats());
            }

            PoolMessage::GetWorker { index, reply } => {
                let _ = reply.send(state.workers.get(index).cloned());
            }

            PoolMessage::Terminate => {
                tracing::info!("Terminating worker pool");
                state.terminating = true;

                let outstanding = state.dispatcher.drain();
                let rejected = outstanding.len();
                for (job_id, reply) in outstanding {
                    state.reject(job_id, None, reply, PoolError::Terminated);
                }

                for worker in state.workers.drain(..) {
                    worker.stop(None);
                }

                state.broadcast(PoolEvent::PoolTerminated {
                    rejected,
                    timestamp: Utc::now(),
                });
                myself.stop(None);
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let (cell, reason) = match message {
            SupervisionEvent::ActorFailed(cell, err) => (cell, err.to_string()),
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                (cell, reason.unwrap_or_else(|| "stopped".to_string()))
            }
            _ => return Ok(()),
        };

        if state.terminating {
            return Ok(());
        }

        let Some(index) = state
            .workers
            .iter()
            .position(|w| w.get_id() == cell.get_id())
        else {
            return Ok(());
        };

        tracing::warn!("Worker {} exited unexpectedly: {}", index, reason);

        if let Some(job_id) = state.dispatcher.job_on(index) {
            state.settle(job_id, Err(PoolError::WorkerFault { detail: reason }));
        }

        // On failure the dead actor stays in the slot and the next post
        // to it retries the spawn.
        match spawn_worker(&myself, state.handlers.clone(), index).await {
            Ok(replacement) => state.workers[index] = replacement,
            Err(e) => tracing::warn!("Failed to respawn worker {}: {}", index, e),
        }
        dispatch(&myself, state).await;

        Ok(())
    }
}
