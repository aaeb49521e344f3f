//! Actor system for the worker pool.
//!
//! This crate provides the Ractor-based pool that runs compute jobs on a
//! bounded set of worker actors.
//!
//! # Architecture
//!
//! - `WorkerPool` - Cloneable handle used by callers
//! - `PoolActor` - Owns the FIFO queue, the worker slots and the active job map
//! - `WorkerActor` - Runs one job at a time on the blocking thread pool
//!
//! # Usage
//!
//! ```ignore
//! use actors::{PoolConfig, WorkerPool};
//!
//! let pool = WorkerPool::start(PoolConfig::from_env()?).await?;
//! let total = pool.execute(request).await?;
//! println!("{:?}", pool.stats().await?);
//! pool.terminate();
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod messages;
mod pool;
mod pool_actor;
mod worker_actor;

pub use config::{DEFAULT_EVENT_CAPACITY, MAX_WORKERS_CAP, PoolConfig, hardware_concurrency_hint};
pub use error::{ConfigError, PoolError};
pub use handler::{FnHandler, HandlerResult, TaskHandler, TaskRegistry};
pub use messages::{JobOutcome, PoolMessage, WorkerMessage};
pub use pool::WorkerPool;
pub use pool_actor::PoolActor;
pub use worker_actor::WorkerActor;

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
