//! asyncffi-runtime - Tokio execution engine for the native library
//!
//! This crate provides:
//! - [`NativeEngine`], the Tokio runtime that runs accepted calls
//! - [`EngineSlot`], the start-once / stop-for-good process-wide holder
//! - [`Teardown`] and [`TeardownSignal`] so in-flight calls still complete
//!   when the engine stops

mod engine;
mod teardown;

pub use asyncffi_core::RuntimeConfig;
pub use engine::{EngineSlot, NativeEngine};
pub use teardown::{InFlight, Teardown, TeardownSignal};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{EngineSlot, NativeEngine, RuntimeConfig, TeardownSignal};
}
