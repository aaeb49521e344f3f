//! Caller-facing handle to the prefetcher.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use ractor::{Actor, ActorRef};
use scheduler_core::Priority;
use tokio::task::JoinHandle;

use crate::config::PrefetchConfig;
use crate::error::PrefetchError;
use crate::idle::{IdleHook, NoIdle};
use crate::messages::{PrefetchMessage, PrefetchStats, PrefetchTicket};
use crate::network::{NetworkMonitor, ResourceGate, UnknownNetwork};
use crate::prefetch_actor::{PrefetchActor, PrefetchActorState};
use crate::registry::RouteRegistry;

/// Warms up routes ahead of navigation.
///
/// None of the scheduling operations fail: loads that cannot run are
/// skipped and load failures are logged. Cloning the handle is cheap.
#[derive(Clone)]
pub struct PrefetchScheduler {
    actor: ActorRef<PrefetchMessage>,
    registry: Arc<RouteRegistry>,
    idle: Arc<dyn IdleHook>,
    batch_size: usize,
    idle_timeout: Duration,
}

impl PrefetchScheduler {
    /// Start a prefetcher for a host without network information or idle
    /// facility.
    pub async fn start(
        config: PrefetchConfig,
        registry: RouteRegistry,
    ) -> Result<Self, PrefetchError> {
        Self::start_with(config, registry, Arc::new(UnknownNetwork), Arc::new(NoIdle)).await
    }

    /// Start a prefetcher with host-provided network information and idle
    /// hook.
    pub async fn start_with(
        config: PrefetchConfig,
        registry: RouteRegistry,
        network: Arc<dyn NetworkMonitor>,
        idle: Arc<dyn IdleHook>,
    ) -> Result<Self, PrefetchError> {
        let registry = Arc::new(registry);
        let gate = ResourceGate::new(&config, network);
        let state = PrefetchActorState::new(registry.clone(), gate, config.delays);

        let (actor, _handle) = Actor::spawn(None, PrefetchActor, state)
            .await
            .map_err(|e| PrefetchError::Spawn(e.to_string()))?;

        Ok(Self {
            actor,
            registry,
            idle,
            batch_size: config.batch_size.max(1),
            idle_timeout: config.idle_timeout,
        })
    }

    fn send(&self, message: PrefetchMessage) {
        if self.actor.send_message(message).is_err() {
            tracing::debug!("{}", PrefetchError::Stopped);
        }
    }

    /// Debounced prefetch. Repeated calls for one route within the delay
    /// collapse into a single load at the newest priority.
    pub fn schedule(&self, route: impl Into<String>, priority: Priority) {
        self.send(PrefetchMessage::Schedule {
            route: route.into(),
            priority,
        });
    }

    /// Load a route now and wait for it, joining a load already running.
    pub async fn prefetch(&self, route: impl Into<String>, priority: Priority) {
        let (tx, rx) = ractor::concurrency::oneshot();
        let route = route.into();
        let message = PrefetchMessage::Prefetch {
            route,
            priority,
            reply: tx.into(),
        };
        if self.actor.send_message(message).is_err() {
            tracing::debug!("{}", PrefetchError::Stopped);
            return;
        }

        if let Ok(PrefetchTicket::InFlight(done)) = rx.await {
            let _ = done.await;
        }
    }

    /// Load routes most urgent first, at most `batch_size` at a time.
    pub async fn prefetch_batch<I, S>(&self, routes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut routes: Vec<String> = routes.into_iter().map(Into::into).collect();
        self.registry.sort_by_priority(&mut routes);

        for batch in routes.chunks(self.batch_size) {
            join_all(
                batch
                    .iter()
                    .map(|route| self.prefetch(route.clone(), self.registry.priority_of(route))),
            )
            .await;
        }
    }

    /// Load every critical route once the host is idle, or after the idle
    /// timeout, whichever comes first. Without an idle facility the routes
    /// load right away.
    pub fn prefetch_critical_on_idle(&self) -> JoinHandle<()> {
        // Created before spawning so an idle signal sent right after this
        // call is not missed.
        let idle = self.idle.idle();
        let this = self.clone();
        tokio::spawn(async move {
            if let Some(idle) = idle {
                tokio::select! {
                    _ = idle => {}
                    _ = tokio::time::sleep(this.idle_timeout) => {
                        tracing::debug!("No idle period within {:?}", this.idle_timeout);
                    }
                }
            }

            let critical = this.registry.routes_with_priority(Priority::Critical);
            tracing::debug!("Prefetching {} critical routes", critical.len());
            this.prefetch_batch(critical).await;
        })
    }

    /// Schedule every route related to `route` at its configured priority.
    pub fn prefetch_related(&self, route: &str) {
        for related in self.registry.related(route) {
            self.schedule(related.route.clone(), related.priority);
        }
    }

    /// Whether a route finished loading. `false` once the prefetcher stopped.
    pub async fn is_prefetched(&self, route: impl Into<String>) -> bool {
        let (tx, rx) = ractor::concurrency::oneshot();
        let message = PrefetchMessage::IsPrefetched {
            route: route.into(),
            reply: tx.into(),
        };
        if self.actor.send_message(message).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Forget every completed route and abort armed timers.
    pub fn clear(&self) {
        self.send(PrefetchMessage::Clear);
    }

    /// Abort armed timers. Running loads finish.
    pub fn cancel_pending(&self) {
        self.send(PrefetchMessage::CancelPending);
    }

    /// Current prefetch state. Empty once the prefetcher stopped.
    pub async fn stats(&self) -> PrefetchStats {
        let (tx, rx) = ractor::concurrency::oneshot();
        if self
            .actor
            .send_message(PrefetchMessage::GetStats { reply: tx.into() })
            .is_err()
        {
            return PrefetchStats::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Stop the prefetcher, aborting armed timers.
    pub fn shutdown(&self) {
        self.send(PrefetchMessage::Shutdown);
    }
}
