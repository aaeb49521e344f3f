//! Resource-awareness gate.
//!
//! Before any load the prefetcher asks the host how constrained it is.
//! Constrained hosts only load essential (critical and high) routes.

use std::sync::Arc;

use scheduler_core::Priority;
use tokio::sync::watch;

use crate::config::PrefetchConfig;

/// Connection and device conditions as reported by the host.
///
/// Every field is optional; unknown values never restrict prefetching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInfo {
    pub save_data: bool,
    /// Effective connection type, e.g. `4g`, `3g`, `2g`, `slow-2g`.
    pub effective_type: Option<String>,
    pub downlink_mbps: Option<f64>,
    pub device_memory_gb: Option<f64>,
}

impl NetworkInfo {
    pub fn with_save_data(mut self, save_data: bool) -> Self {
        self.save_data = save_data;
        self
    }

    pub fn with_effective_type(mut self, effective_type: impl Into<String>) -> Self {
        self.effective_type = Some(effective_type.into());
        self
    }

    pub fn with_downlink_mbps(mut self, mbps: f64) -> Self {
        self.downlink_mbps = Some(mbps);
        self
    }

    pub fn with_device_memory_gb(mut self, gb: f64) -> Self {
        self.device_memory_gb = Some(gb);
        self
    }
}

/// Source of current network information.
pub trait NetworkMonitor: Send + Sync + 'static {
    /// Current conditions, or `None` when the host cannot tell.
    fn current(&self) -> Option<NetworkInfo>;
}

/// A host without network information.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownNetwork;

impl NetworkMonitor for UnknownNetwork {
    fn current(&self) -> Option<NetworkInfo> {
        None
    }
}

/// Fixed conditions.
#[derive(Debug, Clone, Default)]
pub struct StaticNetwork(pub NetworkInfo);

impl NetworkMonitor for StaticNetwork {
    fn current(&self) -> Option<NetworkInfo> {
        Some(self.0.clone())
    }
}

/// Conditions published by the host through a watch channel.
impl NetworkMonitor for watch::Receiver<Option<NetworkInfo>> {
    fn current(&self) -> Option<NetworkInfo> {
        self.borrow().clone()
    }
}

/// Decides whether a load at a given priority may proceed.
#[derive(Clone)]
pub struct ResourceGate {
    monitor: Arc<dyn NetworkMonitor>,
    low_memory_gb: f64,
    min_downlink_mbps: f64,
}

impl ResourceGate {
    pub fn new(config: &PrefetchConfig, monitor: Arc<dyn NetworkMonitor>) -> Self {
        Self {
            monitor,
            low_memory_gb: config.low_memory_gb,
            min_downlink_mbps: config.min_downlink_mbps,
        }
    }

    /// Save-data, a 2G-class connection or a downlink below the threshold.
    pub fn is_slow(&self, info: &NetworkInfo) -> bool {
        info.save_data
            || matches!(info.effective_type.as_deref(), Some("slow-2g" | "2g"))
            || info
                .downlink_mbps
                .is_some_and(|mbps| mbps < self.min_downlink_mbps)
    }

    pub fn is_low_memory(&self, info: &NetworkInfo) -> bool {
        info.device_memory_gb
            .is_some_and(|gb| gb < self.low_memory_gb)
    }

    /// Whether a load at `priority` may start now.
    pub fn admits(&self, priority: Priority) -> bool {
        let Some(info) = self.monitor.current() else {
            return true;
        };

        if self.is_slow(&info) || self.is_low_memory(&info) {
            return priority.is_essential();
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(info: NetworkInfo) -> ResourceGate {
        ResourceGate::new(&PrefetchConfig::default(), Arc::new(StaticNetwork(info)))
    }

    fn admitted(gate: &ResourceGate) -> Vec<Priority> {
        Priority::ALL
            .into_iter()
            .filter(|p| gate.admits(*p))
            .collect()
    }

    #[test]
    fn unknown_network_admits_everything() {
        let gate = ResourceGate::new(&PrefetchConfig::default(), Arc::new(UnknownNetwork));
        assert_eq!(admitted(&gate), Priority::ALL.to_vec());
    }

    #[test]
    fn fast_network_admits_everything() {
        let gate = gate(
            NetworkInfo::default()
                .with_effective_type("4g")
                .with_downlink_mbps(10.0)
                .with_device_memory_gb(8.0),
        );
        assert_eq!(admitted(&gate), Priority::ALL.to_vec());
    }

    #[test]
    fn constrained_hosts_admit_only_essential() {
        let essential = vec![Priority::Critical, Priority::High];

        for info in [
            NetworkInfo::default().with_save_data(true),
            NetworkInfo::default().with_effective_type("2g"),
            NetworkInfo::default().with_effective_type("slow-2g"),
            NetworkInfo::default().with_downlink_mbps(0.5),
            NetworkInfo::default().with_device_memory_gb(1.0),
        ] {
            assert_eq!(admitted(&gate(info.clone())), essential, "{info:?}");
        }
    }

    #[test]
    fn three_g_is_not_slow() {
        let gate = gate(NetworkInfo::default().with_effective_type("3g"));
        assert!(gate.admits(Priority::Low));
    }

    #[test]
    fn follows_published_conditions() {
        let (tx, rx) = watch::channel(None);
        let gate = ResourceGate::new(&PrefetchConfig::default(), Arc::new(rx));
        assert!(gate.admits(Priority::Low));

        tx.send_replace(Some(NetworkInfo::default().with_save_data(true)));
        assert!(!gate.admits(Priority::Low));
        assert!(gate.admits(Priority::High));
    }
}
