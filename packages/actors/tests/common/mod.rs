use std::time::Duration;

use actors::{FnHandler, PoolConfig, PoolError, TaskRegistry, WorkerPool};
use scheduler_core::{PoolEvent, WorkerRequest};
use serde_json::{Value, json};
use tokio::sync::broadcast;

/// Built-in calculators plus `sleep` (blocks for `ms`, then returns
/// `value`) and `panic`.
pub fn test_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::with_builtin();
    registry.register(FnHandler::new("sleep", |data: Value| {
        let ms = data["ms"].as_u64().unwrap_or(0);
        std::thread::sleep(Duration::from_millis(ms));
        Ok(data["value"].clone())
    }));
    registry.register(FnHandler::new("panic", |_: Value| -> actors::HandlerResult {
        panic!("calculator blew up")
    }));
    registry
}

pub async fn start_pool(max_workers: usize) -> Result<WorkerPool, PoolError> {
    WorkerPool::with_registry(
        PoolConfig::default().with_max_workers(max_workers),
        test_registry(),
    )
    .await
}

pub fn sleep_job(ms: u64, value: i64) -> WorkerRequest {
    WorkerRequest::new("sleep", json!({ "ms": ms, "value": value }))
}

/// Everything currently buffered on an event receiver.
pub fn drain_events(rx: &mut broadcast::Receiver<PoolEvent>) -> Vec<PoolEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
