//! # asyncffi
//!
//! Await results from a native library that reports completion through C
//! callbacks.
//!
//! The native side starts work from a C entry point and calls back later, on
//! a thread of its own, with an opaque token. asyncffi hides that protocol:
//! - Explicit one-shot runtime lifecycle
//! - Exactly one outcome per call, including rejections and shutdown
//! - Buffer ownership enforced by types on both sides of the boundary
//!
//! ## Quick Start
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> asyncffi::BridgeResult<()> {
//!     let greeting = asyncffi::say_hello_async("Stephen", Some(100_000)).await?;
//!     println!("{}", greeting);
//!     asyncffi::shutdown()
//! }
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`asyncffi_core`] - Errors, lifecycle states, runtime configuration
//! - [`asyncffi_bridge`] - Tokens, dispatchers, and the completion bridge
//! - [`asyncffi_native`] - The C ABI library itself

pub use asyncffi_core::{BridgeError, BridgeResult, LogLevel, RuntimeConfig, RuntimeState};

pub use asyncffi_bridge::{
    BridgeConfig, CompletionBridge, CompletionToken, NativeApi, NativeLibrary, PendingCompletion,
    ProtocolVariant, RuntimeLifecycle, TokenRegistry,
};

pub use tokio;
pub use tracing;

/// C ABI functions of the native library.
///
/// Add `pub use asyncffi::native_exports::*;` to a `cdylib` crate to ship
/// the native library under another name.
pub mod native_exports {
    pub use asyncffi_native::{
        cleanup_async_runtime, free_rust_string, init_async_runtime,
        init_async_runtime_with_config, say_hello_async, say_hello_async_with_error,
        set_log_callback, set_log_level,
    };
}

/// Greet `name` through the statically linked native library
///
/// Starts the native runtime on first use. `samples` sets the native
/// workload; `None` lets the native side choose one.
pub async fn say_hello_async(name: &str, samples: Option<usize>) -> BridgeResult<String> {
    CompletionBridge::global(ProtocolVariant::ResultOrError)
        .say_hello(name, samples)
        .await
}

/// Stop the native runtime behind [`say_hello_async`]
///
/// Calls still in flight resolve before this returns. Later calls fail with
/// [`BridgeError::RuntimeShutdownError`].
pub fn shutdown() -> BridgeResult<()> {
    RuntimeLifecycle::global().shutdown()
}

/// Prelude module for convenient imports.
///
/// Use `use asyncffi::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        BridgeConfig, BridgeError, BridgeResult, CompletionBridge, PendingCompletion,
        ProtocolVariant, RuntimeConfig, RuntimeLifecycle, say_hello_async,
    };
}
