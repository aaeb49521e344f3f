//! Core domain types for the background scheduling system.
//!
//! This crate contains shared types used across all packages:
//! - Worker protocol messages and job envelopes
//! - Task kinds, their payloads, and the reference calculators
//! - Pool statistics and lifecycle events
//! - Prefetch priorities
//! - Environment-backed configuration helpers

pub mod calc;
pub mod env;
mod events;
mod job;
mod pool;
mod priority;
mod task;

pub use events::PoolEvent;
pub use job::{JobEnvelope, JobId, ResultEnvelope, TaskKind, WorkerRequest, WorkerResponse};
pub use pool::PoolStats;
pub use priority::{ParsePriorityError, Priority};
pub use task::{
    AnalyticsInput, AnalyticsOperation, ChartInput, ChartPoint, CurrencyInput, PricingInput,
    TaskError,
};
