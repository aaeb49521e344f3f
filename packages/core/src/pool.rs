//! Worker pool introspection types.

use serde::{Deserialize, Serialize};

/// Point-in-time counters for a worker pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    /// Number of workers created so far.
    pub total_workers: usize,
    /// Jobs currently bound to a worker.
    pub active_jobs: usize,
    /// Jobs waiting for a free worker.
    pub queued_jobs: usize,
}

impl PoolStats {
    /// Jobs accepted but not yet settled.
    pub fn outstanding(&self) -> usize {
        self.active_jobs + self.queued_jobs
    }

    /// Workers with no job bound.
    pub fn idle_workers(&self) -> usize {
        self.total_workers.saturating_sub(self.active_jobs)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[test]
    fn stats_serialize_camel_case() {
        let stats = PoolStats {
            total_workers: 2,
            active_jobs: 1,
            queued_jobs: 3,
        };
        let encoded = serde_json::to_value(stats).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!({"totalWorkers": 2, "activeJobs": 1, "queuedJobs": 3})
        );
        assert_eq!(stats.outstanding(), 4);
        assert_eq!(stats.idle_workers(), 1);
    }
}
