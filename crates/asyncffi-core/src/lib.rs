//! asyncffi-core - Shared types for both sides of the completion boundary
//!
//! This crate provides the foundational types used by the native library and
//! by the caller-side completion bridge:
//! - [`BridgeError`] for the per-call and lifecycle error taxonomy
//! - [`RuntimeState`] for the one-shot runtime lifecycle state machine
//! - [`RuntimeConfig`] for configuring the native execution engine
//! - [`LogLevel`] for log records crossing the boundary

mod config;
mod error;
mod lifecycle;
mod log_level;

pub use config::RuntimeConfig;
pub use error::{BridgeError, BridgeResult};
pub use lifecycle::RuntimeState;
pub use log_level::LogLevel;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BridgeError, BridgeResult, LogLevel, RuntimeConfig, RuntimeState};
}
