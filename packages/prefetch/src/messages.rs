//! Message types for the prefetch actor.

use ractor::RpcReplyPort;
use scheduler_core::Priority;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::PrefetchError;

/// Messages for the PrefetchActor.
#[derive(Debug)]
pub enum PrefetchMessage {
    /// Debounced request: (re)arm the timer for a route.
    Schedule { route: String, priority: Priority },

    /// A debounce timer elapsed.
    TimerFired { route: String, generation: u64 },

    /// Load a route now, or join the load already running.
    Prefetch {
        route: String,
        priority: Priority,
        reply: RpcReplyPort<PrefetchTicket>,
    },

    /// A detached load finished.
    LoadFinished {
        route: String,
        epoch: u64,
        result: Result<(), PrefetchError>,
    },

    IsPrefetched {
        route: String,
        reply: RpcReplyPort<bool>,
    },

    /// Forget completed routes and abort armed timers.
    Clear,

    /// Abort armed timers only.
    CancelPending,

    GetStats { reply: RpcReplyPort<PrefetchStats> },

    Shutdown,
}

/// Answer to [`PrefetchMessage::Prefetch`].
#[derive(Debug)]
pub enum PrefetchTicket {
    /// Already loaded.
    Done,
    /// Not loaded: gated, no loader, or the prefetcher is shutting down.
    Skipped,
    /// A load is running; the receiver fires when it finishes.
    InFlight(oneshot::Receiver<()>),
}

/// Snapshot of prefetch state. Route lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchStats {
    pub prefetched: Vec<String>,
    pub in_flight: Vec<String>,
    pub scheduled: Vec<String>,
}
