//! Job identity and the worker message protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::task::{AnalyticsInput, ChartInput, CurrencyInput, PricingInput};

/// Unique identifier for a job, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of computation a request asks for.
///
/// Open for forward compatibility: any string that is not one of the
/// built-in kinds is kept verbatim in [`TaskKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskKind {
    Pricing,
    Analytics,
    Currency,
    Chart,
    Other(String),
}

impl TaskKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Pricing => "pricing",
            TaskKind::Analytics => "analytics",
            TaskKind::Currency => "currency",
            TaskKind::Chart => "chart",
            TaskKind::Other(name) => name,
        }
    }

    /// Whether this is one of the built-in kinds.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, TaskKind::Other(_))
    }
}

impl From<String> for TaskKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pricing" => TaskKind::Pricing,
            "analytics" => TaskKind::Analytics,
            "currency" => TaskKind::Currency,
            "chart" => TaskKind::Chart,
            _ => TaskKind::Other(value),
        }
    }
}

impl From<&str> for TaskKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<TaskKind> for String {
    fn from(value: TaskKind) -> Self {
        match value {
            TaskKind::Other(name) => name,
            builtin => builtin.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request posted from the pool to a worker: `{ "kind": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// Which calculation to run.
    pub kind: TaskKind,
    /// Kind-specific input. Plain data only.
    pub data: Value,
}

impl WorkerRequest {
    /// Create a request from an already-encoded payload.
    pub fn new(kind: impl Into<TaskKind>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Create a request by encoding a typed payload.
    pub fn encode<T: Serialize>(
        kind: impl Into<TaskKind>,
        data: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, serde_json::to_value(data)?))
    }

    pub fn pricing(input: &PricingInput) -> Result<Self, serde_json::Error> {
        Self::encode(TaskKind::Pricing, input)
    }

    pub fn analytics(input: &AnalyticsInput) -> Result<Self, serde_json::Error> {
        Self::encode(TaskKind::Analytics, input)
    }

    pub fn currency(input: &CurrencyInput) -> Result<Self, serde_json::Error> {
        Self::encode(TaskKind::Currency, input)
    }

    pub fn chart(input: &ChartInput) -> Result<Self, serde_json::Error> {
        Self::encode(TaskKind::Chart, input)
    }
}

/// Response posted from a worker back to the pool, exactly one per request.
///
/// Serializes as `{ "type": "success", "data": ... }` or
/// `{ "type": "error", "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerResponse {
    Success { data: Value },
    Error { error: String },
}

impl WorkerResponse {
    pub fn success(data: Value) -> Self {
        WorkerResponse::Success { data }
    }

    pub fn error(error: impl Into<String>) -> Self {
        WorkerResponse::Error {
            error: error.into(),
        }
    }
}

/// A request tagged with the job it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub job_id: JobId,
    #[serde(flatten)]
    pub request: WorkerRequest,
}

/// A response tagged with the job it settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub job_id: JobId,
    #[serde(flatten)]
    pub response: WorkerResponse,
}
