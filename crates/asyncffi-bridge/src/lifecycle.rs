//! Explicit lifecycle of the native runtime
//!
//! The native runtime is started at most once and stopped at most once per
//! native library, for the whole process. The state machine lives in
//! [`RuntimeState`]; this module drives the native library through it and
//! fails every call that arrives in the wrong state.

use crate::native::{NativeApi, NativeLibrary};
use crate::token::TokenRegistry;
use asyncffi_core::{BridgeError, BridgeResult, RuntimeConfig, RuntimeState};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global lifecycle bound to the statically linked native library
static GLOBAL_LIFECYCLE: OnceCell<Arc<RuntimeLifecycle>> = OnceCell::new();

/// Source of lifecycle ids; tokens record the id of the lifecycle that issued them
static NEXT_LIFECYCLE_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by every lifecycle over the same native library
///
/// Calls hold the state for reading from the active check until the native
/// entry point returns; shutdown needs it for writing.
struct LifecycleCore {
    id: u64,
    state: RwLock<RuntimeState>,
}

/// The core for the library behind `api`, keyed by its `init` address
///
/// Entries are never removed, so a library shut down once stays shut down.
fn core_for(api: &NativeApi) -> Arc<LifecycleCore> {
    static CORES: OnceCell<DashMap<usize, Arc<LifecycleCore>>> = OnceCell::new();
    CORES
        .get_or_init(DashMap::new)
        .entry(api.init as usize)
        .or_insert_with(|| {
            Arc::new(LifecycleCore {
                id: NEXT_LIFECYCLE_ID.fetch_add(1, Ordering::SeqCst),
                state: RwLock::new(RuntimeState::Uninitialized),
            })
        })
        .clone()
}

/// Handle on the native runtime of one native library
///
/// Handles over the same library share one state: shutting down through any
/// of them shuts the library down for all. The configuration is per handle
/// and only the handle that actually starts the runtime applies it.
pub struct RuntimeLifecycle {
    core: Arc<LifecycleCore>,
    api: NativeApi,
    config: Option<RuntimeConfig>,
    // Keeps a dynamically loaded library mapped while `api` is in use
    _library: Option<NativeLibrary>,
}

impl RuntimeLifecycle {
    /// Create a lifecycle over a function table
    pub fn new(api: NativeApi) -> Self {
        Self {
            core: core_for(&api),
            api,
            config: None,
            _library: None,
        }
    }

    /// Create a lifecycle over a dynamically loaded library
    pub fn from_library(library: NativeLibrary) -> Self {
        let mut lifecycle = Self::new(*library.api());
        lifecycle._library = Some(library);
        lifecycle
    }

    /// Start the native runtime with this configuration instead of its defaults
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The process-wide lifecycle of the statically linked native library
    pub fn global() -> Arc<RuntimeLifecycle> {
        GLOBAL_LIFECYCLE
            .get_or_init(|| Arc::new(RuntimeLifecycle::new(NativeApi::linked())))
            .clone()
    }

    /// Identifier recorded in the tokens this lifecycle's bridges issue
    ///
    /// Shared by every lifecycle over the same native library.
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// The native function table
    pub fn api(&self) -> &NativeApi {
        &self.api
    }

    /// Current state
    pub fn state(&self) -> RuntimeState {
        *self.core.state.read()
    }

    /// Start the native runtime
    ///
    /// Idempotent once active. A failed start is permanent: this and every
    /// later call return [`BridgeError::RuntimeInitError`]. Starting again
    /// after shutdown is an [`BridgeError::InvalidLifecycleTransition`].
    pub fn initialize(&self) -> BridgeResult<()> {
        // Held across the native call so concurrent callers wait for the outcome
        let mut state = self.core.state.write();
        match *state {
            RuntimeState::Active => return Ok(()),
            RuntimeState::Failed => return Err(init_failed()),
            _ => transition(&mut state, RuntimeState::Initializing)?,
        }

        let started = panic::catch_unwind(AssertUnwindSafe(|| self.start_native()))
            .unwrap_or_else(|_| Err(init_failed()));

        match started {
            Ok(()) => {
                transition(&mut state, RuntimeState::Active)?;
                tracing::info!(lifecycle = self.id(), "Native runtime active");
                Ok(())
            }
            Err(e) => {
                transition(&mut state, RuntimeState::Failed)?;
                tracing::error!(lifecycle = self.id(), "Native runtime failed to start: {}", e);
                Err(e)
            }
        }
    }

    fn start_native(&self) -> BridgeResult<()> {
        let started = match (&self.config, self.api.init_with_config) {
            (Some(config), Some(init_with_config)) => {
                let json = config.to_json()?;
                // SAFETY: json is valid for its length for the duration of the call
                unsafe { init_with_config(json.as_ptr(), json.len()) }
            }
            (Some(_), None) => {
                return Err(BridgeError::ConfigError(
                    "native library cannot accept a runtime configuration".to_string(),
                ));
            }
            // SAFETY: init takes no arguments
            (None, _) => unsafe { (self.api.init)() },
        };

        if started {
            Ok(())
        } else {
            Err(init_failed())
        }
    }

    /// Check that calls may be started
    pub fn ensure_active(&self) -> BridgeResult<()> {
        check_active(*self.core.state.read())
    }

    /// Run `f` with the runtime held active
    ///
    /// Shutdown cannot begin until `f` returns, so a call started inside `f`
    /// is either rejected or owned by the native library before cleanup runs.
    /// `f` must not call back into this lifecycle.
    pub fn while_active<F, R>(&self, f: F) -> BridgeResult<R>
    where
        F: FnOnce() -> R,
    {
        let state = self.core.state.read();
        check_active(*state)?;
        Ok(f())
    }

    /// Stop the native runtime
    ///
    /// The native library completes the calls it accepted before its cleanup
    /// returns; any call to this library still waiting afterwards resolves
    /// to [`BridgeError::RuntimeShutdownError`]. A second call is a no-op.
    pub fn shutdown(&self) -> BridgeResult<()> {
        {
            // Waits for calls inside `while_active` to hand off to native code
            let mut state = self.core.state.write();
            match *state {
                RuntimeState::ShuttingDown | RuntimeState::ShutDown => return Ok(()),
                _ => transition(&mut state, RuntimeState::ShuttingDown)?,
            }
        }

        // Cleanup waits on native tasks, so it runs without the state lock
        let cleanup = self.api.cleanup;
        // SAFETY: cleanup takes no arguments
        if panic::catch_unwind(move || unsafe { cleanup() }).is_err() {
            tracing::error!(lifecycle = self.id(), "Native cleanup panicked");
        }

        let drained =
            TokenRegistry::global().drain_owned_by(self.id(), &BridgeError::RuntimeShutdownError);
        if drained > 0 {
            tracing::warn!(
                lifecycle = self.id(),
                "{} call(s) never completed by native code; resolved as shut down",
                drained
            );
        }

        transition(&mut self.core.state.write(), RuntimeState::ShutDown)?;
        tracing::info!(lifecycle = self.id(), "Native runtime shut down");
        Ok(())
    }
}

impl std::fmt::Debug for RuntimeLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeLifecycle")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn transition(state: &mut RuntimeState, to: RuntimeState) -> BridgeResult<()> {
    if !state.can_transition_to(to) {
        return Err(BridgeError::InvalidLifecycleTransition {
            from: state.to_string(),
            to: to.to_string(),
        });
    }
    *state = to;
    Ok(())
}

fn check_active(state: RuntimeState) -> BridgeResult<()> {
    match state {
        RuntimeState::Active => Ok(()),
        RuntimeState::Uninitialized | RuntimeState::Initializing => {
            Err(BridgeError::RuntimeNotInitialized)
        }
        RuntimeState::Failed => Err(init_failed()),
        RuntimeState::ShuttingDown | RuntimeState::ShutDown => {
            Err(BridgeError::RuntimeShutdownError)
        }
    }
}

fn init_failed() -> BridgeError {
    BridgeError::RuntimeInitError("native runtime failed to start".to_string())
}

#[cfg(test)]
#[path = "lifecycle/lifecycle_tests.rs"]
mod lifecycle_tests;
