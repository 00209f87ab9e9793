//! Strings crossing the C boundary
//!
//! Inputs are borrowed from the caller only for the duration of the entry
//! point, so they are copied immediately. Outputs are allocated here, handed
//! to a callback, and reclaimed by `free_rust_string`.

use asyncffi_core::{BridgeError, BridgeResult};
use std::ffi::{CStr, CString, c_char};

/// Copy a caller-owned NUL-terminated UTF-8 string
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of this call.
pub(crate) unsafe fn read_input(ptr: *const c_char) -> BridgeResult<String> {
    if ptr.is_null() {
        return Err(BridgeError::InvalidInput("input string is null".to_string()));
    }

    // SAFETY: caller guarantees ptr is a valid NUL-terminated string
    let text = unsafe { CStr::from_ptr(ptr) }.to_str()?;
    Ok(text.to_owned())
}

/// Allocate a NUL-terminated copy of `text` owned by the caller
///
/// Interior NUL bytes would silently truncate the string on the other side,
/// so they are replaced.
pub(crate) fn into_caller_owned(text: &str) -> *mut c_char {
    let sanitized = if text.contains('\0') {
        text.replace('\0', "?")
    } else {
        text.to_owned()
    };

    match CString::new(sanitized) {
        Ok(c_string) => c_string.into_raw(),
        // Unreachable after sanitizing; an empty string is still a valid answer
        Err(_) => CString::default().into_raw(),
    }
}

/// Reclaim a string produced by [`into_caller_owned`]
///
/// # Safety
/// `ptr` must be null or come from [`into_caller_owned`] and not have been
/// reclaimed before.
pub(crate) unsafe fn reclaim(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: caller guarantees ptr came from CString::into_raw
    drop(unsafe { CString::from_raw(ptr) });
}
