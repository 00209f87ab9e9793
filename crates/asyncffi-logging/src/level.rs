//! Runtime-adjustable level filter

use crate::sink::LogSink;
use asyncffi_core::LogLevel;
use once_cell::sync::OnceCell;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{Registry, reload};

type FilterHandle = reload::Handle<LevelFilter, Registry>;

static FILTER: OnceCell<FilterHandle> = OnceCell::new();

/// Remember the filter handle of the subscriber installed by `init_logging`
///
/// Only the first handle is kept; there is only ever one global subscriber.
pub(crate) fn register_filter(handle: FilterHandle) {
    let _ = FILTER.set(handle);
}

/// Whether this crate's subscriber is the process-wide default
pub fn filter_installed() -> bool {
    FILTER.get().is_some()
}

/// Change the level at which native records reach the host
///
/// Updates the sink threshold and, when this crate owns the global
/// subscriber, its level filter as well.
pub fn set_log_level(level: LogLevel) {
    LogSink::global().set_level(level);

    if let Some(handle) = FILTER.get() {
        if let Err(e) = handle.reload(level_filter(level)) {
            tracing::debug!("level filter not reloaded: {}", e);
        }
    }
}

pub(crate) fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}
