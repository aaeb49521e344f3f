//! Priority-based route prefetching.
//!
//! A single prefetch actor owns all bookkeeping: completed routes, running
//! loads and armed debounce timers. Callers use the cloneable
//! [`PrefetchScheduler`] handle.
//!
//! # Usage
//!
//! ```ignore
//! use prefetch::{FnLoader, PrefetchConfig, PrefetchScheduler, RouteRegistry};
//! use scheduler_core::Priority;
//!
//! let mut registry = RouteRegistry::new();
//! registry.register("home", Priority::Critical, FnLoader::new(|| async { Ok(()) }));
//!
//! let prefetcher = PrefetchScheduler::start(PrefetchConfig::from_env()?, registry).await?;
//! prefetcher.schedule("home", Priority::Critical);
//! prefetcher.prefetch_critical_on_idle();
//! ```

mod config;
mod error;
mod idle;
mod messages;
mod network;
mod prefetch_actor;
mod registry;
mod scheduler;

pub use config::{DEFAULT_BATCH_SIZE, DEFAULT_IDLE_TIMEOUT, DebounceDelays, PrefetchConfig};
pub use error::{ConfigError, PrefetchError};
pub use idle::{IdleFuture, IdleHook, IdleSignal, NoIdle};
pub use messages::{PrefetchMessage, PrefetchStats, PrefetchTicket};
pub use network::{NetworkInfo, NetworkMonitor, ResourceGate, StaticNetwork, UnknownNetwork};
pub use prefetch_actor::PrefetchActor;
pub use registry::{FnLoader, LoadFuture, ModuleLoader, RelatedRoute, RouteRegistry};
pub use scheduler::PrefetchScheduler;
