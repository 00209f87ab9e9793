//! asyncffi-native - The native side of the completion protocol
//!
//! A C ABI library owning a Tokio execution engine. Callers start a greeting
//! through one of two entry points and receive the outcome later, on an engine
//! thread, through a callback carrying the caller's opaque token.
//!
//! # FFI Functions
//!
//! - `init_async_runtime` - Start the engine with default configuration
//! - `init_async_runtime_with_config` - Start the engine from a JSON config
//! - `cleanup_async_runtime` - Tear the engine down
//! - `say_hello_async` - Result-only completion; `false` means rejected
//! - `say_hello_async_with_error` - Result-or-error completion
//! - `free_rust_string` - Release a string handed to a callback
//! - `set_log_callback` / `set_log_level` - Route library logs to the host
//!
//! Strings crossing the boundary are NUL-terminated UTF-8. Input strings are
//! copied before the entry point returns; output strings are allocated here
//! and must come back through `free_rust_string` exactly once.

mod buffer;
mod engine;
mod exports;
pub mod greeting;
mod panic_guard;

pub use exports::{
    ResultCallback, ResultOrErrorCallback, cleanup_async_runtime, free_rust_string,
    init_async_runtime, init_async_runtime_with_config, say_hello_async,
    say_hello_async_with_error, set_log_callback, set_log_level,
};
pub use asyncffi_logging::LogCallback;
