//! Host idle facility.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Notify;

/// Resolves when the host has idle capacity.
pub type IdleFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Lets the host tell the prefetcher when it is idle.
pub trait IdleHook: Send + Sync + 'static {
    /// A future resolving at the next idle period, or `None` when the host
    /// has no idle facility.
    fn idle(&self) -> Option<IdleFuture>;
}

/// A host without an idle facility. Idle work runs immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdle;

impl IdleHook for NoIdle {
    fn idle(&self) -> Option<IdleFuture> {
        None
    }
}

/// Idle hook driven by the host calling [`IdleSignal::notify_idle`].
#[derive(Debug, Clone, Default)]
pub struct IdleSignal {
    notify: Arc<Notify>,
}

impl IdleSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake everything currently waiting for idle time.
    pub fn notify_idle(&self) {
        self.notify.notify_waiters();
    }
}

impl IdleHook for IdleSignal {
    fn idle(&self) -> Option<IdleFuture> {
        Some(Box::pin(self.notify.clone().notified_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_wakes_waiters_created_before_it() {
        let signal = IdleSignal::new();
        let idle = signal.idle();
        signal.notify_idle();

        let woke = match idle {
            Some(idle) => tokio::time::timeout(Duration::from_millis(100), idle)
                .await
                .is_ok(),
            None => false,
        };
        assert!(woke);
    }

    #[test]
    fn no_idle_has_no_future() {
        assert!(NoIdle.idle().is_none());
    }
}
