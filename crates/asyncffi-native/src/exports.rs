//! C ABI exported functions
//!
//! These functions are the FFI entry points called by the host. Every one of
//! them runs its body inside [`catch_panic`], so no panic unwinds into the
//! caller.

use crate::buffer::{into_caller_owned, read_input, reclaim};
use crate::engine;
use crate::greeting;
use crate::panic_guard::{catch_panic, install_panic_hook};
use asyncffi_core::{BridgeError, BridgeResult, LogLevel, RuntimeConfig};
use asyncffi_logging::{LogCallback, LogSink};
use std::ffi::{c_char, c_void};
use std::panic::AssertUnwindSafe;
use std::ptr;

/// Result-only completion callback: `(result, token)`
///
/// A null `result` means the call failed after it was accepted.
pub type ResultCallback = extern "C" fn(result: *const c_char, token: *mut c_void);

/// Result-or-error completion callback: `(result, error, token)`
///
/// Exactly one of `result` and `error` is non-null.
pub type ResultOrErrorCallback =
    extern "C" fn(result: *const c_char, error: *const c_char, token: *mut c_void);

/// Where an accepted call delivers its single completion
///
/// The token is carried as an address so the completion can move to an engine
/// thread; its bits are handed back untouched.
#[derive(Clone, Copy)]
enum Completion {
    ResultOnly {
        callback: ResultCallback,
        token: usize,
    },
    ResultOrError {
        callback: ResultOrErrorCallback,
        token: usize,
    },
}

impl Completion {
    fn deliver(self, outcome: BridgeResult<String>) {
        match (self, outcome) {
            (Completion::ResultOnly { callback, token }, Ok(text)) => {
                callback(into_caller_owned(&text), token as *mut c_void);
            }
            (Completion::ResultOnly { callback, token }, Err(e)) => {
                tracing::warn!(token, "Completing with null result: {}", e);
                callback(ptr::null(), token as *mut c_void);
            }
            (Completion::ResultOrError { callback, token }, Ok(text)) => {
                callback(into_caller_owned(&text), ptr::null(), token as *mut c_void);
            }
            (Completion::ResultOrError { callback, token }, Err(e)) => {
                tracing::debug!(token, "Completing with error: {}", e);
                callback(
                    ptr::null(),
                    into_caller_owned(&e.to_wire()),
                    token as *mut c_void,
                );
            }
        }
    }
}

/// Initialize the async runtime with default configuration
///
/// Idempotent: returns `true` if the runtime is running after the call.
/// After [`cleanup_async_runtime`] the runtime cannot be started again and
/// this returns `false`.
#[unsafe(no_mangle)]
pub extern "C" fn init_async_runtime() -> bool {
    catch_panic(|| init_impl(RuntimeConfig::default())).unwrap_or(false)
}

/// Initialize the async runtime from a JSON [`RuntimeConfig`]
///
/// A null or empty config means the default configuration. If the runtime
/// is already running the config is ignored and `true` is returned.
///
/// # Safety
/// `config_json` must be null or valid for `config_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn init_async_runtime_with_config(
    config_json: *const u8,
    config_len: usize,
) -> bool {
    catch_panic(AssertUnwindSafe(|| {
        let config = if config_json.is_null() || config_len == 0 {
            RuntimeConfig::default()
        } else {
            // SAFETY: caller guarantees config_json is valid for config_len bytes
            let bytes = unsafe { std::slice::from_raw_parts(config_json, config_len) };
            match RuntimeConfig::from_json(bytes) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("Failed to parse runtime config: {}", e);
                    return false;
                }
            }
        };
        init_impl(config)
    }))
    .unwrap_or(false)
}

fn init_impl(config: RuntimeConfig) -> bool {
    asyncffi_logging::init_logging(config.log_level());
    install_panic_hook();

    match engine::start(config) {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Failed to initialize async runtime: {}", e);
            false
        }
    }
}

/// Shut the async runtime down
///
/// Calls already accepted receive their completion before this returns,
/// either their result or a shutdown failure. Calling it with no runtime
/// running is a no-op. Later calls are answered with a shutdown error.
#[unsafe(no_mangle)]
pub extern "C" fn cleanup_async_runtime() {
    if catch_panic(engine::stop).is_err() {
        tracing::error!("Async runtime cleanup panicked");
    }
}

/// Start a greeting whose completion carries only a result
///
/// Returns `false` if the call was rejected: null `who`, `callback` or
/// `token`, invalid UTF-8, or no running runtime. A rejected call never
/// invokes the callback. After `true` the callback is invoked exactly once,
/// on an engine thread, with a string to release through
/// [`free_rust_string`], or with null if the call failed.
///
/// `samples` is the Monte Carlo sample count; zero picks one at random.
///
/// # Safety
/// `who` must be null or a NUL-terminated string valid for this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn say_hello_async(
    who: *const c_char,
    samples: usize,
    callback: Option<ResultCallback>,
    token: *mut c_void,
) -> bool {
    let Some(callback) = callback else {
        tracing::error!("say_hello_async called with null callback");
        return false;
    };
    if token.is_null() {
        tracing::error!("say_hello_async called with null token");
        return false;
    }

    let accepted = catch_panic(AssertUnwindSafe(|| {
        // SAFETY: caller guarantees who is null or a valid C string
        let who = unsafe { read_input(who) }?;
        start_greeting(
            who,
            samples,
            Completion::ResultOnly {
                callback,
                token: token as usize,
            },
        )
    }));

    match accepted {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!("say_hello_async rejected: {}", e);
            false
        }
        Err(_) => false,
    }
}

/// Start a greeting whose completion carries a result or an error
///
/// Returns `false` only if `callback` or `token` is null. Every other
/// outcome, including invalid input or a missing runtime, is reported through
/// exactly one callback invocation, which may happen before this returns.
/// Both strings handed to the callback are released through
/// [`free_rust_string`].
///
/// # Safety
/// `who` must be null or a NUL-terminated string valid for this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn say_hello_async_with_error(
    who: *const c_char,
    samples: usize,
    callback: Option<ResultOrErrorCallback>,
    token: *mut c_void,
) -> bool {
    let Some(callback) = callback else {
        tracing::error!("say_hello_async_with_error called with null callback");
        return false;
    };
    if token.is_null() {
        tracing::error!("say_hello_async_with_error called with null token");
        return false;
    }

    let completion = Completion::ResultOrError {
        callback,
        token: token as usize,
    };

    // Spawning is the last fallible step, so a failure here means the
    // completion has not been handed to a task yet
    let started = catch_panic(AssertUnwindSafe(|| {
        // SAFETY: caller guarantees who is null or a valid C string
        let who = unsafe { read_input(who) }?;
        start_greeting(who, samples, completion)
    }));

    match started {
        Ok(Ok(())) => {}
        Ok(Err(e)) => completion.deliver(Err(e)),
        Err(message) => completion.deliver(Err(BridgeError::Internal(message))),
    }
    true
}

fn start_greeting(who: String, samples: usize, completion: Completion) -> BridgeResult<()> {
    engine::with_engine(|engine| {
        let mut teardown = engine.teardown_signal();
        engine.spawn_completion(async move {
            let outcome = tokio::select! {
                result = greeting::say_hello(who, samples) => result,
                _ = teardown.begun() => Err(BridgeError::RuntimeShutdownError),
            };
            completion.deliver(outcome);
        });
    })
}

/// Release a string handed to a completion callback
///
/// Null is a no-op.
///
/// # Safety
/// `ptr` must be null or a string received from a completion callback that
/// has not been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_rust_string(ptr: *mut c_char) {
    // SAFETY: caller guarantees ptr came from a completion callback
    let _ = catch_panic(AssertUnwindSafe(|| unsafe { reclaim(ptr) }));
}

/// Route library log events to a host callback; null detaches it
#[unsafe(no_mangle)]
pub extern "C" fn set_log_callback(callback: Option<LogCallback>) {
    LogSink::global().set_callback(callback);
}

/// Change the library log level (0=Trace .. 4=Error, 5=Off)
#[unsafe(no_mangle)]
pub extern "C" fn set_log_level(level: u8) {
    let _ = catch_panic(|| asyncffi_logging::set_log_level(LogLevel::from_u8(level)));
}
