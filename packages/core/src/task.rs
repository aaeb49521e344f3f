//! Payload types for the built-in task kinds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Input for a `pricing` job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    pub base_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Display currency. Carried for callers, not used by the calculation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Tax rate in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
}

impl PricingInput {
    pub fn new(base_price: f64) -> Self {
        Self {
            base_price,
            ..Default::default()
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = Some(tax_rate);
        self
    }
}

/// Aggregate computed by an `analytics` job.
///
/// Only these four operations exist. A payload naming any other operation
/// fails to decode and the job is rejected as an invalid payload rather
/// than answered with `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsOperation {
    Sum,
    Average,
    Median,
    Stddev,
}

/// Input for an `analytics` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsInput {
    pub data: Vec<f64>,
    pub operation: AnalyticsOperation,
}

/// Input for a `currency` job. Rates are units of a currency per one EUR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInput {
    pub amount: f64,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

/// A single chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

impl ChartPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Input for a `chart` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartInput {
    pub data: Vec<ChartPoint>,
    /// Moving-average window size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f64>,
}

/// Failure raised while running a task inside a worker.
///
/// The display string is what travels back in the `error` field of the
/// worker response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Unknown worker message type: {0}")]
    UnknownKind(String),

    #[error("invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl TaskError {
    pub fn invalid_payload(kind: impl Into<String>, err: impl std::fmt::Display) -> Self {
        TaskError::InvalidPayload {
            kind: kind.into(),
            reason: err.to_string(),
        }
    }
}

impl From<String> for TaskError {
    fn from(value: String) -> Self {
        TaskError::Failed(value)
    }
}

impl From<&str> for TaskError {
    fn from(value: &str) -> Self {
        TaskError::Failed(value.to_string())
    }
}
