//! The Tokio engine that runs native work and owes callers their completions

use crate::teardown::{Teardown, TeardownSignal};
use asyncffi_core::{BridgeError, BridgeResult, RuntimeConfig};
use parking_lot::Mutex;
use std::future::Future;
use std::time::Instant;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// A multi-threaded Tokio runtime plus teardown bookkeeping
pub struct NativeEngine {
    runtime: Runtime,
    teardown: Teardown,
    config: RuntimeConfig,
}

impl NativeEngine {
    /// Build the engine described by `config`
    pub fn new(config: RuntimeConfig) -> BridgeResult<Self> {
        if config.worker_threads == Some(0) {
            return Err(BridgeError::ConfigError(
                "worker_threads must be greater than zero".to_string(),
            ));
        }
        if config.max_blocking_threads == 0 {
            return Err(BridgeError::ConfigError(
                "max_blocking_threads must be greater than zero".to_string(),
            ));
        }

        let mut builder = Builder::new_multi_thread();
        builder
            .thread_name(&config.thread_name)
            .max_blocking_threads(config.max_blocking_threads);
        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }
        if config.enable_io {
            builder.enable_io();
        }
        if config.enable_time {
            builder.enable_time();
        }

        let runtime = builder.build().map_err(|e| {
            BridgeError::RuntimeInitError(format!("failed to build tokio runtime: {}", e))
        })?;

        Ok(Self {
            runtime,
            teardown: Teardown::new(),
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Signal that fires when teardown begins
    pub fn teardown_signal(&self) -> TeardownSignal {
        self.teardown.signal()
    }

    pub fn is_tearing_down(&self) -> bool {
        self.teardown.has_begun()
    }

    /// Tasks spawned with [`spawn_completion`](Self::spawn_completion) that
    /// have not finished
    pub fn in_flight(&self) -> usize {
        self.teardown.in_flight()
    }

    /// Spawn a task that owes its caller a completion
    ///
    /// Teardown waits for such tasks (up to `shutdown_timeout_ms`) before
    /// dropping the runtime.
    pub fn spawn_completion<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let in_flight = self.teardown.enter();
        self.runtime.spawn(async move {
            let output = task.await;
            drop(in_flight);
            output
        })
    }

    /// Fire the teardown signal, wait for in-flight tasks, drop the runtime
    ///
    /// The whole sequence is bounded by `shutdown_timeout_ms`.
    pub fn shutdown(self) {
        let grace = self.config.shutdown_timeout();
        let started = Instant::now();
        tracing::info!(grace_ms = grace.as_millis() as u64, "engine teardown started");

        self.teardown.begin();
        if !self.teardown.drain(grace) {
            tracing::warn!(
                in_flight = self.teardown.in_flight(),
                "grace period over with tasks still running"
            );
        }

        let remaining = grace.saturating_sub(started.elapsed());
        let runtime = self.runtime;
        if tokio::runtime::Handle::try_current().is_ok() {
            // Tokio refuses to drop a runtime from within an async context
            let dropped = std::thread::spawn(move || runtime.shutdown_timeout(remaining)).join();
            if dropped.is_err() {
                tracing::error!("engine drop thread panicked");
            }
        } else {
            runtime.shutdown_timeout(remaining);
        }

        tracing::info!("engine teardown complete");
    }
}

enum SlotState {
    Empty,
    Running(NativeEngine),
    Stopped,
}

/// Process-wide slot holding at most one [`NativeEngine`]
///
/// Once an engine has been stopped the slot stays stopped: a later
/// `start` fails with [`BridgeError::RuntimeShutdownError`].
///
/// The lock covers the slot only: tasks are spawned under it, but teardown
/// runs after the engine has been taken out.
pub struct EngineSlot {
    state: Mutex<SlotState>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Install an engine unless one is already running
    ///
    /// Returns `true` if this call built the engine.
    pub fn start(&self, config: RuntimeConfig) -> BridgeResult<bool> {
        let mut state = self.state.lock();
        match *state {
            SlotState::Running(_) => Ok(false),
            SlotState::Stopped => Err(BridgeError::RuntimeShutdownError),
            SlotState::Empty => {
                *state = SlotState::Running(NativeEngine::new(config)?);
                Ok(true)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Running(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Stopped)
    }

    /// Run `f` against the engine if it accepts work
    pub fn with<F, R>(&self, f: F) -> BridgeResult<R>
    where
        F: FnOnce(&NativeEngine) -> R,
    {
        match &*self.state.lock() {
            SlotState::Running(engine) if engine.is_tearing_down() => {
                Err(BridgeError::RuntimeShutdownError)
            }
            SlotState::Running(engine) => Ok(f(engine)),
            SlotState::Stopped => Err(BridgeError::RuntimeShutdownError),
            SlotState::Empty => Err(BridgeError::RuntimeNotInitialized),
        }
    }

    /// Take the engine out of the slot and tear it down
    ///
    /// Returns `false` if no engine was running. An empty slot stays empty.
    pub fn stop(&self) -> bool {
        let taken = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, SlotState::Stopped) {
                SlotState::Running(engine) => Some(engine),
                SlotState::Empty => {
                    *state = SlotState::Empty;
                    None
                }
                SlotState::Stopped => None,
            }
        };
        match taken {
            Some(engine) => {
                engine.shutdown();
                true
            }
            None => false,
        }
    }
}

impl Default for EngineSlot {
    fn default() -> Self {
        Self::new()
    }
}
