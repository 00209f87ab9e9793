//! asyncffi-logging - Native log records for the host application
//!
//! The native library logs through `tracing`. This crate routes those events
//! to a host-supplied [`LogCallback`], with a level that the host can change
//! at runtime without reinstalling the subscriber.

mod layer;
mod level;
mod sink;

pub use asyncffi_core::LogLevel;
pub use layer::{CallbackLayer, init_logging};
pub use level::{filter_installed, set_log_level};
pub use sink::{LogCallback, LogSink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{CallbackLayer, LogCallback, LogLevel, LogSink, init_logging, set_log_level};
}
