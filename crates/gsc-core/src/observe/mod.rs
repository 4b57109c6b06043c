//! # Observability
//!
//! - **Logging**: `tracing` events from construction and numeric recovery,
//!   with an optional subscriber installer
//! - **Health**: per-instance counters of numeric recoveries

pub mod health;
pub mod logging;

pub use health::{Counter, HealthSnapshot, NumericHealth};
pub use logging::{init_logging, LogConfig, LogFormat};
