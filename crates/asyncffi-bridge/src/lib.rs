//! asyncffi-bridge - Awaitable futures over a callback-driven C ABI
//!
//! The native library starts work from a C entry point and reports the
//! outcome later, on one of its own threads, through a callback carrying an
//! opaque token. This crate turns each such call into a
//! [`PendingCompletion`] future:
//!
//! - [`RuntimeLifecycle`] starts and stops the native runtime once per
//!   native library
//! - [`InputBuffer`] and [`NativeString`] enforce who frees which buffer
//! - [`TokenRegistry`] maps opaque tokens back to waiting futures
//! - [`dispatch_result`] and [`dispatch_result_or_error`] are the callbacks
//!   handed to native code
//! - [`CompletionBridge`] ties them together
//!
//! # Example
//!
//! ```ignore
//! use asyncffi_bridge::prelude::*;
//!
//! let bridge = CompletionBridge::global(ProtocolVariant::ResultOrError);
//! let greeting = bridge.say_hello("Stephen", Some(10_000)).await?;
//! ```

mod bridge;
mod buffer;
mod dispatcher;
mod lifecycle;
mod native;
mod token;

pub use asyncffi_core::{BridgeError, BridgeResult, RuntimeConfig, RuntimeState};
pub use bridge::{BridgeConfig, CompletionBridge, ProtocolVariant};
pub use buffer::{InputBuffer, NativeString};
pub use dispatcher::{dispatch_result, dispatch_result_or_error};
pub use lifecycle::RuntimeLifecycle;
pub use native::{
    FreeStringFn, NativeApi, NativeLibrary, ResultCallback, ResultOrErrorCallback,
};
pub use token::{CompletionToken, PendingCompletion, PendingToken, TokenRegistry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BridgeConfig, BridgeError, BridgeResult, CompletionBridge, NativeApi, PendingCompletion,
        ProtocolVariant, RuntimeConfig, RuntimeLifecycle,
    };
}
