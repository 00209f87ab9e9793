//! Native runtime configuration

use crate::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the native execution engine
///
/// Travels across the boundary as JSON bytes (see `init_async_runtime_with_config`).
/// Missing fields take their default, so `{}` is a complete document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Tokio worker threads; `None` means one per core
    pub worker_threads: Option<usize>,

    pub thread_name: String,

    pub enable_io: bool,

    pub enable_time: bool,

    /// Upper bound on the blocking pool, where the greeting workload runs
    pub max_blocking_threads: usize,

    /// Grace period for in-flight calls during teardown
    pub shutdown_timeout_ms: u64,

    /// Level name as accepted by [`LogLevel::parse`]
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "asyncffi-worker".to_string(),
            enable_io: true,
            enable_time: true,
            max_blocking_threads: 512,
            shutdown_timeout_ms: 5_000,
            log_level: LogLevel::Info.as_str().to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; empty input yields the defaults
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Serialize the configuration for transfer across the boundary
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the teardown grace period
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level.as_str().to_string();
        self
    }

    /// Teardown grace period as a [`Duration`]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Parsed log level, falling back to `Info` for unknown names
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }
}
