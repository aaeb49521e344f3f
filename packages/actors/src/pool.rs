//! Caller-facing handle to a running worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ractor::{Actor, ActorRef};
use scheduler_core::{PoolEvent, PoolStats, WorkerRequest};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::{MAX_WORKERS_CAP, PoolConfig};
use crate::error::PoolError;
use crate::handler::TaskRegistry;
use crate::messages::{PoolMessage, WorkerMessage};
use crate::pool_actor::{PoolActor, PoolActorState};

/// A bounded pool of worker actors fed from a FIFO queue.
///
/// Cloning the handle is cheap; every clone talks to the same pool.
///
/// # Example
///
/// ```ignore
/// use actors::{PoolConfig, WorkerPool};
/// use scheduler_core::{AnalyticsInput, AnalyticsOperation, WorkerRequest};
///
/// let pool = WorkerPool::start(PoolConfig::default()).await?;
/// let request = WorkerRequest::analytics(&AnalyticsInput {
///     data: vec![2.0, 4.0, 6.0, 8.0],
///     operation: AnalyticsOperation::Average,
/// })?;
/// let average: f64 = pool.execute_as(request).await?;
/// pool.terminate();
/// ```
#[derive(Clone)]
pub struct WorkerPool {
    actor: ActorRef<PoolMessage>,
    events: broadcast::Sender<PoolEvent>,
    terminated: Arc<AtomicBool>,
    max_workers: usize,
}

impl WorkerPool {
    /// Start a pool running the built-in calculators.
    pub async fn start(config: PoolConfig) -> Result<Self, PoolError> {
        Self::with_registry(config, TaskRegistry::with_builtin()).await
    }

    /// Start a pool running the handlers in `registry`.
    ///
    /// `max_workers` is clamped to `1..=MAX_WORKERS_CAP` and a zero
    /// `event_capacity` is raised to 1, however the config was built.
    pub async fn with_registry(
        config: PoolConfig,
        registry: TaskRegistry,
    ) -> Result<Self, PoolError> {
        let config = PoolConfig {
            max_workers: config.max_workers.clamp(1, MAX_WORKERS_CAP),
            event_capacity: config.event_capacity.max(1),
            ..config
        };
        let (events, _) = broadcast::channel(config.event_capacity);
        let state = PoolActorState::new(&config, Arc::new(registry), events.clone());

        let (actor, _handle) = Actor::spawn(None, PoolActor, state)
            .await
            .map_err(|e| PoolError::Spawn(e.to_string()))?;

        Ok(Self {
            actor,
            events,
            terminated: Arc::new(AtomicBool::new(false)),
            max_workers: config.max_workers,
        })
    }

    /// Submit a job and wait for its result.
    ///
    /// Returns immediately once the job is queued; the future resolves when
    /// a worker settles it. All failures arrive through the result.
    pub async fn execute(&self, request: WorkerRequest) -> Result<Value, PoolError> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(PoolError::Terminated);
        }

        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(PoolMessage::Execute {
                request,
                reply: tx.into(),
            })
            .map_err(|_| PoolError::Terminated)?;

        rx.await.map_err(|_| PoolError::Terminated)?
    }

    /// Submit a job and decode its result.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        request: WorkerRequest,
    ) -> Result<T, PoolError> {
        let value = self.execute(request).await?;
        serde_json::from_value(value).map_err(|e| PoolError::InvalidResult(e.to_string()))
    }

    /// Reject every outstanding job and stop all workers.
    ///
    /// Idempotent. Later calls to [`execute`](Self::execute) fail with
    /// [`PoolError::Terminated`].
    pub fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.actor.send_message(PoolMessage::Terminate) {
            tracing::debug!("Pool already stopped: {}", e);
        }
    }

    /// Whether [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Snapshot of worker and queue counts.
    pub async fn stats(&self) -> Result<PoolStats, PoolError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(PoolMessage::GetStats { reply: tx.into() })
            .map_err(|_| PoolError::Terminated)?;

        rx.await.map_err(|_| PoolError::Terminated)
    }

    /// Actor currently serving worker slot `index`, if that slot was
    /// spawned.
    pub async fn worker(&self, index: usize) -> Result<Option<ActorRef<WorkerMessage>>, PoolError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(PoolMessage::GetWorker {
                index,
                reply: tx.into(),
            })
            .map_err(|_| PoolError::Terminated)?;

        rx.await.map_err(|_| PoolError::Terminated)
    }

    /// Subscribe to pool events. Events sent before subscribing are not
    /// replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    /// Effective worker bound.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}
