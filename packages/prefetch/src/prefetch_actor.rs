//! Prefetch actor: owns every piece of prefetch state.
//!
//! Per route the actor tracks at most one armed debounce timer and at most
//! one running load. Loads run as detached tasks and report back with
//! [`PrefetchMessage::LoadFinished`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use scheduler_core::Priority;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::DebounceDelays;
use crate::error::PrefetchError;
use crate::messages::{PrefetchMessage, PrefetchStats, PrefetchTicket};
use crate::network::ResourceGate;
use crate::registry::RouteRegistry;

struct Timer {
    generation: u64,
    priority: Priority,
    handle: JoinHandle<()>,
}

struct InFlight {
    priority: Priority,
    waiters: Vec<oneshot::Sender<()>>,
}

/// State for the prefetch actor.
pub struct PrefetchActorState {
    registry: Arc<RouteRegistry>,
    gate: ResourceGate,
    delays: DebounceDelays,
    prefetched: HashSet<String>,
    in_flight: HashMap<String, InFlight>,
    timers: HashMap<String, Timer>,
    next_generation: u64,
    /// Bumped by `Clear`; loads started in an older epoch are not recorded.
    epoch: u64,
}

impl PrefetchActorState {
    pub fn new(registry: Arc<RouteRegistry>, gate: ResourceGate, delays: DebounceDelays) -> Self {
        Self {
            registry,
            gate,
            delays,
            prefetched: HashSet::new(),
            in_flight: HashMap::new(),
            timers: HashMap::new(),
            next_generation: 0,
            epoch: 0,
        }
    }

    fn abort_timers(&mut self) -> usize {
        let count = self.timers.len();
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
        count
    }

    fn stats(&self) -> PrefetchStats {
        fn sorted<'a>(routes: impl Iterator<Item = &'a String>) -> Vec<String> {
            let mut routes: Vec<String> = routes.cloned().collect();
            routes.sort();
            routes
        }

        PrefetchStats {
            prefetched: sorted(self.prefetched.iter()),
            in_flight: sorted(self.in_flight.keys()),
            scheduled: sorted(self.timers.keys()),
        }
    }
}

/// Cancel any armed timer for the route and arm a new one. Last request wins.
fn arm_timer(
    myself: &ActorRef<PrefetchMessage>,
    state: &mut PrefetchActorState,
    route: String,
    priority: Priority,
) {
    if let Some(previous) = state.timers.remove(&route) {
        previous.handle.abort();
    }

    state.next_generation += 1;
    let generation = state.next_generation;
    let delay = state.delays.for_priority(priority);

    let actor = myself.clone();
    let fired = route.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = actor.send_message(PrefetchMessage::TimerFired {
            route: fired,
            generation,
        });
    });

    tracing::debug!("Scheduled {} ({} priority) in {:?}", route, priority, delay);
    state.timers.insert(
        route,
        Timer {
            generation,
            priority,
            handle,
        },
    );
}

/// Start loading a route unless it is done, running, gated or unknown.
fn start_load(
    myself: &ActorRef<PrefetchMessage>,
    state: &mut PrefetchActorState,
    route: String,
    priority: Priority,
) -> PrefetchTicket {
    if state.prefetched.contains(&route) {
        return PrefetchTicket::Done;
    }

    if let Some(load) = state.in_flight.get_mut(&route) {
        let (tx, rx) = oneshot::channel();
        load.waiters.push(tx);
        return PrefetchTicket::InFlight(rx);
    }

    if !state.gate.admits(priority) {
        tracing::debug!(
            "Skipping {} ({} priority) on a constrained host",
            route,
            priority
        );
        return PrefetchTicket::Skipped;
    }

    let Some(loader) = state.registry.loader(&route) else {
        tracing::warn!("{}", PrefetchError::NoLoader(route));
        return PrefetchTicket::Skipped;
    };

    let (tx, rx) = oneshot::channel();
    state.in_flight.insert(
        route.clone(),
        InFlight {
            priority,
            waiters: vec![tx],
        },
    );

    let actor = myself.clone();
    let epoch = state.epoch;
    tokio::spawn(async move {
        let result = match tokio::spawn(loader.load()).await {
            Ok(result) => result,
            Err(e) => Err(PrefetchError::load_failed(&route, e)),
        };
        let _ = actor.send_message(PrefetchMessage::LoadFinished {
            route,
            epoch,
            result,
        });
    });

    PrefetchTicket::InFlight(rx)
}

/// Prefetch actor.
pub struct PrefetchActor;

impl Actor for PrefetchActor {
    type Msg = PrefetchMessage;
    type State = PrefetchActorState;
    type Arguments = PrefetchActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting prefetcher with {} routes",
            args.registry.routes().len()
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
            PrefetchMessage::Schedule { route, priority } => {
                if state.prefetched.contains(&route) || state.in_flight.contains_key(&route) {
                    tracing::debug!("Ignoring schedule for {}: already loaded or loading", route);
                    return Ok(());
                }
                arm_timer(&myself, state, route, priority);
            }

            PrefetchMessage::TimerFired { route, generation } => {
                let current = state
                    .timers
                    .get(&route)
                    .is_some_and(|timer| timer.generation == generation);
                if !current {
                    return Ok(());
                }

                if let Some(timer) = state.timers.remove(&route) {
                    // Nobody waits on a debounced load.
                    drop(start_load(&myself, state, route, timer.priority));
                }
            }

            PrefetchMessage::Prefetch {
                route,
                priority,
                reply,
            } => {
                let ticket = start_load(&myself, state, route, priority);
                let _ = reply.send(ticket);
            }

            PrefetchMessage::LoadFinished {
                route,
                epoch,
                result,
            } => {
                let Some(load) = state.in_flight.remove(&route) else {
                    return Ok(());
                };

                match result {
                    Ok(()) if epoch == state.epoch => {
                        tracing::debug!("Prefetched {} ({} priority)", route, load.priority);
                        state.prefetched.insert(route);
                    }
                    Ok(()) => {
                        tracing::debug!("Not recording {}: cleared while loading", route);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to prefetch {}: {}", route, e);
                    }
                }

                for waiter in load.waiters {
                    let _ = waiter.send(());
                }
            }

            PrefetchMessage::IsPrefetched { route, reply } => {
                let _ = reply.send(state.prefetched.contains(&route));
            }

            PrefetchMessage::Clear => {
                let aborted = state.abort_timers();
                tracing::info!(
                    "Clearing {} prefetched routes and {} pending timers",
                    state.prefetched.len(),
                    aborted
                );
                state.prefetched.clear();
                state.epoch += 1;
            }

            PrefetchMessage::CancelPending => {
                let aborted = state.abort_timers();
                tracing::debug!("Cancelled {} pending prefetches", aborted);
            }

            PrefetchMessage::GetStats { reply } => {
                let _ = reply.send(state.stats());
            }

            PrefetchMessage::Shutdown => {
                tracing::info!("Stopping prefetcher");
                myself.stop(None);
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.abort_timers();
        Ok(())
    }
}
