//! Task handler trait and registry.

use std::collections::HashMap;
use std::sync::Arc;

use scheduler_core::{
    AnalyticsInput, ChartInput, CurrencyInput, PricingInput, TaskError, TaskKind, WorkerRequest,
    WorkerResponse, calc,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Result type for task handlers.
pub type HandlerResult = Result<Value, TaskError>;

/// Trait for task handlers.
///
/// Implement this trait to define how requests of a specific kind are
/// computed. Handlers run on a worker's blocking thread and must not keep
/// state between calls.
pub trait TaskHandler: Send + Sync + 'static {
    /// The task kind this handler computes.
    fn kind(&self) -> TaskKind;

    /// Compute a result from the request payload.
    fn handle(&self, data: Value) -> HandlerResult;
}

/// Registry for task handlers.
///
/// Maps task kinds to their handlers for dynamic dispatch.
#[derive(Default)]
pub struct TaskRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl TaskRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a registry with the pricing, analytics, currency and chart
    /// calculators registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BuiltinHandler(TaskKind::Pricing));
        registry.register(BuiltinHandler(TaskKind::Analytics));
        registry.register(BuiltinHandler(TaskKind::Currency));
        registry.register(BuiltinHandler(TaskKind::Chart));
        registry
    }

    /// Register a handler for a task kind, replacing any previous one.
    pub fn register<H: TaskHandler>(&mut self, handler: H) {
        self.handlers.insert(handler.kind(), Arc::new(handler));
    }

    /// Get a handler for a task kind.
    pub fn get(&self, kind: &TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(kind).cloned()
    }

    /// Check if a handler exists for a task kind.
    pub fn has_handler(&self, kind: &TaskKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// List all registered task kinds.
    pub fn kinds(&self) -> Vec<&TaskKind> {
        self.handlers.keys().collect()
    }

    /// Run a request to completion and build the worker response.
    ///
    /// Every failure, including an unknown kind, becomes an error response.
    pub fn run(&self, request: WorkerRequest) -> WorkerResponse {
        let WorkerRequest { kind, data } = request;

        let result = match self.get(&kind) {
            Some(handler) => handler.handle(data),
            None => Err(TaskError::UnknownKind(kind.to_string())),
        };

        match result {
            Ok(data) => WorkerResponse::success(data),
            Err(err) => WorkerResponse::error(err.to_string()),
        }
    }
}

/// Handler for one of the built-in kinds, backed by [`calc`].
struct BuiltinHandler(TaskKind);

impl TaskHandler for BuiltinHandler {
    fn kind(&self) -> TaskKind {
        self.0.clone()
    }

    fn handle(&self, data: Value) -> HandlerResult {
        match &self.0 {
            TaskKind::Pricing => typed(&self.0, data, |input: &PricingInput| calc::pricing(input)),
            TaskKind::Analytics => {
                typed(&self.0, data, |input: &AnalyticsInput| calc::analytics(input))
            }
            TaskKind::Currency => {
                typed(&self.0, data, |input: &CurrencyInput| calc::currency(input))
            }
            TaskKind::Chart => typed(&self.0, data, |input: &ChartInput| calc::chart(input)),
            TaskKind::Other(name) => Err(TaskError::UnknownKind(name.clone())),
        }
    }
}

fn typed<I, O>(kind: &TaskKind, data: Value, compute: impl FnOnce(&I) -> O) -> HandlerResult
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I =
        serde_json::from_value(data).map_err(|e| TaskError::invalid_payload(kind.as_str(), e))?;
    serde_json::to_value(compute(&input)).map_err(|e| TaskError::Failed(e.to_string()))
}

/// A simple function-based task handler.
pub struct FnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
{
    kind: TaskKind,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
{
    /// Create a new function-based handler.
    pub fn new(kind: impl Into<TaskKind>, handler: F) -> Self {
        Self {
            kind: kind.into(),
            handler,
        }
    }
}

impl<F> TaskHandler for FnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
{
    fn kind(&self) -> TaskKind {
        self.kind.clone()
    }

    fn handle(&self, data: Value) -> HandlerResult {
        (self.handler)(data)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_kinds_are_registered() {
        let registry = TaskRegistry::with_builtin();
        for kind in [
            TaskKind::Pricing,
            TaskKind::Analytics,
            TaskKind::Currency,
            TaskKind::Chart,
        ] {
            assert!(registry.has_handler(&kind), "missing {kind}");
        }
        assert_eq!(registry.kinds().len(), 4);
    }

    #[test]
    fn runs_analytics_average() {
        let registry = TaskRegistry::with_builtin();
        let response = registry.run(WorkerRequest::new(
            "analytics",
            json!({"data": [2, 4, 6, 8], "operation": "average"}),
        ));
        assert_eq!(response, WorkerResponse::success(json!(5.0)));
    }

    #[test]
    fn unknown_kind_becomes_error_response() {
        let registry = TaskRegistry::with_builtin();
        let response = registry.run(WorkerRequest::new("unsupported", json!({})));
        assert_eq!(
            response,
            WorkerResponse::error("Unknown worker message type: unsupported")
        );
    }

    #[test]
    fn malformed_payload_becomes_error_response() {
        let registry = TaskRegistry::with_builtin();
        let response = registry.run(WorkerRequest::new("pricing", json!({"quantity": 2})));
        match response {
            WorkerResponse::Error { error } => {
                assert!(error.starts_with("invalid payload for pricing"), "{error}");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn unrecognised_analytics_operation_is_rejected() {
        let registry = TaskRegistry::with_builtin();
        let response = registry.run(WorkerRequest::new(
            "analytics",
            json!({"data": [1, 2, 3], "operation": "mode"}),
        ));
        match response {
            WorkerResponse::Error { error } => {
                assert!(error.starts_with("invalid payload for analytics"), "{error}");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn custom_handlers_extend_the_kind_set() {
        let mut registry = TaskRegistry::new();
        registry.register(FnHandler::new("double", |data: Value| {
            let n = data.as_f64().ok_or("expected a number")?;
            Ok(json!(n * 2.0))
        }));

        assert_eq!(
            registry.run(WorkerRequest::new("double", json!(21))),
            WorkerResponse::success(json!(42.0))
        );
        assert_eq!(
            registry.run(WorkerRequest::new("double", json!("x"))),
            WorkerResponse::error("expected a number")
        );
    }
}
