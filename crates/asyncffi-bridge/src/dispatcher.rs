//! Callbacks handed to native code
//!
//! Invoked on a native thread, possibly re-entrantly from inside the entry
//! point. A dispatch only copies strings and sends on a oneshot channel, so
//! it never blocks the native thread, and nothing unwinds back into native
//! code.

use crate::buffer::NativeString;
use crate::native::FreeStringFn;
use crate::token::{CompletionToken, TokenRegistry};
use asyncffi_core::{BridgeError, BridgeResult};
use std::any::Any;
use std::ffi::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// Completion callback for the result-only protocol
///
/// A null `result` resolves the call to
/// [`BridgeError::UnexpectedNullResult`].
pub extern "C" fn dispatch_result(result: *const c_char, token: *mut c_void) {
    dispatch(result, ptr::null(), token);
}

/// Completion callback for the result-or-error protocol
///
/// A non-null `error` wins over `result`.
pub extern "C" fn dispatch_result_or_error(
    result: *const c_char,
    error: *const c_char,
    token: *mut c_void,
) {
    dispatch(result, error, token);
}

fn dispatch(result: *const c_char, error: *const c_char, token: *mut c_void) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the native side hands over ownership of both buffers
        unsafe { dispatch_impl(result, error, token) }
    }));

    if let Err(payload) = outcome {
        tracing::error!("Completion dispatch panicked: {}", panic_message(payload.as_ref()));
    }
}

/// # Safety
/// `result` and `error` must each be null or a string that the token's free
/// function releases.
unsafe fn dispatch_impl(result: *const c_char, error: *const c_char, token: *mut c_void) {
    let Some(token) = CompletionToken::from_ptr(token) else {
        tracing::error!("protocol violation: completion delivered with a null token");
        return;
    };

    // Releasing the token is what makes this the one and only completion
    let Some(pending) = TokenRegistry::global().take(token) else {
        tracing::warn!(
            token = token.id(),
            "protocol violation: completion for a released or unknown token ignored"
        );
        return;
    };

    let free = pending.free_fn();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: forwarded from the caller
        unsafe { read_outcome(result, error, free) }
    }))
    .unwrap_or_else(|payload| Err(BridgeError::Internal(panic_message(payload.as_ref()))));

    if !pending.resolve(outcome) {
        tracing::debug!(token = token.id(), "completion delivered to an abandoned future");
    }
}

/// Copy the outcome out of the native buffers, releasing them afterwards
///
/// # Safety
/// As for [`dispatch_impl`].
unsafe fn read_outcome(
    result: *const c_char,
    error: *const c_char,
    free: FreeStringFn,
) -> BridgeResult<String> {
    // SAFETY: forwarded from the caller; both are released when dropped below
    let result = unsafe { NativeString::from_raw(result, free) };
    let error = unsafe { NativeString::from_raw(error, free) };

    match (result, error) {
        (Some(_), Some(error)) => {
            tracing::warn!("protocol violation: completion carried both a result and an error");
            Err(BridgeError::from_wire(&error.copy_text()?))
        }
        (None, Some(error)) => Err(BridgeError::from_wire(&error.copy_text()?)),
        (Some(result), None) => result.copy_text(),
        (None, None) => Err(BridgeError::UnexpectedNullResult),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("completion dispatch panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("completion dispatch panicked: {}", s)
    } else {
        "completion dispatch panicked".to_string()
    }
}
