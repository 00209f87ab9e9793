//! The awaitable API over the native entry points

use crate::buffer::InputBuffer;
use crate::dispatcher::{dispatch_result, dispatch_result_or_error};
use crate::lifecycle::RuntimeLifecycle;
use crate::native::NativeApi;
use crate::token::{PendingCompletion, TokenRegistry};
use asyncffi_core::{BridgeError, BridgeResult, RuntimeConfig, RuntimeState};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Which native entry point, and therefore which callback shape, a bridge uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    /// `say_hello_async_with_error`: failures arrive as error text
    #[default]
    ResultOrError,
    /// `say_hello_async`: failures are a rejected call or a null result
    ResultOnly,
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolVariant::ResultOrError => write!(f, "result-or-error"),
            ProtocolVariant::ResultOnly => write!(f, "result-only"),
        }
    }
}

/// Configuration for a [`CompletionBridge`] with its own lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub variant: ProtocolVariant,

    /// Native runtime configuration (None = the native defaults)
    #[serde(default)]
    pub runtime: Option<RuntimeConfig>,
}

impl BridgeConfig {
    /// Parse a bridge configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> BridgeResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn with_variant(mut self, variant: ProtocolVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

/// Turns native calls into [`PendingCompletion`] futures
#[derive(Debug, Clone)]
pub struct CompletionBridge {
    lifecycle: Arc<RuntimeLifecycle>,
    variant: ProtocolVariant,
}

impl CompletionBridge {
    /// Create a bridge over an existing lifecycle
    pub fn new(lifecycle: Arc<RuntimeLifecycle>, variant: ProtocolVariant) -> Self {
        Self { lifecycle, variant }
    }

    /// Create a bridge with its own lifecycle over a function table
    pub fn from_config(api: NativeApi, config: BridgeConfig) -> Self {
        let mut lifecycle = RuntimeLifecycle::new(api);
        if let Some(runtime) = config.runtime {
            lifecycle = lifecycle.with_config(runtime);
        }
        Self::new(Arc::new(lifecycle), config.variant)
    }

    /// Bridge to the statically linked native library
    pub fn global(variant: ProtocolVariant) -> Self {
        static GLOBAL_BRIDGES: OnceCell<[CompletionBridge; 2]> = OnceCell::new();
        let bridges = GLOBAL_BRIDGES.get_or_init(|| {
            let lifecycle = RuntimeLifecycle::global();
            [
                CompletionBridge::new(lifecycle.clone(), ProtocolVariant::ResultOrError),
                CompletionBridge::new(lifecycle, ProtocolVariant::ResultOnly),
            ]
        });
        match variant {
            ProtocolVariant::ResultOrError => bridges[0].clone(),
            ProtocolVariant::ResultOnly => bridges[1].clone(),
        }
    }

    pub fn lifecycle(&self) -> &Arc<RuntimeLifecycle> {
        &self.lifecycle
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Start a native call and return the future of its outcome
    ///
    /// `workload` is the native sample count; `None` lets the native side
    /// pick one. Failures before the native side accepts the call come back
    /// as an already resolved future.
    pub fn call(&self, input: &str, workload: Option<usize>) -> PendingCompletion {
        let api = *self.lifecycle.api();
        let registry = TokenRegistry::global();
        let samples = workload.unwrap_or(0);

        // Registration and the native entry point run inside one active
        // window, so shutdown either sees the token or rejects the call
        let started = self.lifecycle.while_active(|| {
            let buffer = InputBuffer::new(input)?;
            // Registered before the native call so a synchronous callback finds it
            let (token, pending) = registry.register(api.free_string, self.lifecycle.id());

            let accepted = panic::catch_unwind(AssertUnwindSafe(|| {
                // SAFETY: buffer outlives the call and the dispatchers match the variant
                unsafe {
                    match self.variant {
                        ProtocolVariant::ResultOrError => (api.say_hello_with_error)(
                            buffer.as_ptr(),
                            samples,
                            Some(dispatch_result_or_error),
                            token.as_ptr(),
                        ),
                        ProtocolVariant::ResultOnly => (api.say_hello)(
                            buffer.as_ptr(),
                            samples,
                            Some(dispatch_result),
                            token.as_ptr(),
                        ),
                    }
                }
            }))
            .unwrap_or_else(|_| {
                tracing::error!(token = token.id(), "Native entry point panicked");
                false
            });
            drop(buffer);
            Ok::<_, BridgeError>((token, pending, accepted))
        });

        let (token, pending, accepted) = match started.and_then(|started| started) {
            Ok(started) => started,
            Err(e) => return PendingCompletion::ready(Err(e)),
        };

        if !accepted {
            match registry.take(token) {
                Some(entry) => {
                    tracing::debug!(token = token.id(), variant = %self.variant, "Native call rejected");
                    entry.resolve(Err(BridgeError::NativeCallRejected));
                }
                None => tracing::warn!(
                    token = token.id(),
                    "protocol violation: native entry point rejected a call it already completed"
                ),
            }
        }

        pending
    }

    /// Greet `name`, starting the native runtime first if it was never started
    pub async fn say_hello(&self, name: &str, samples: Option<usize>) -> BridgeResult<String> {
        if self.lifecycle.state() == RuntimeState::Uninitialized {
            self.lifecycle.initialize()?;
        }
        self.call(name, samples).await
    }
}
