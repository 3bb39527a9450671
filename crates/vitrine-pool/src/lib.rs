//! # vitrine-pool
//!
//! Bounded, capability-aware instance pool for embedded workbench
//! components. Manages checkout and reuse of component instances,
//! lifecycle sweeps over idle and running instances, and per-document
//! lease grouping.
//!
//! Use `InstancePool` for checkout/reuse and sweeps, or
//! `DocumentSession` to tie a group of leases to one open document.

pub mod component;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod session;
pub mod snapshot;

pub use component::{ComponentFactory, Engine, InstanceHandle, PooledComponent, ScriptedModel};
pub use config::{
    load_config, ConfigError, LoggingSettings, PoolConfig, PoolSettings, VitrineConfig,
};
pub use error::PoolError;
pub use metrics::{MetricsSnapshot, PoolMetrics};
pub use pool::{InstancePool, Lease, ResetSummary, StopSummary};
pub use session::DocumentSession;
pub use snapshot::{InstanceInfo, PoolSnapshot, PoolStatus};
