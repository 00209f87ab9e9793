//! Buffer ownership across the boundary
//!
//! Two rules, one type each:
//! - the caller allocates the input, keeps it alive for the duration of the
//!   entry point call and frees it right after ([`InputBuffer`])
//! - the native side allocates outputs; the caller copies them and hands
//!   them back to the native free function exactly once ([`NativeString`])

use crate::native::FreeStringFn;
use asyncffi_core::{BridgeError, BridgeResult};
use std::ffi::{CStr, CString, c_char};

/// A caller-owned NUL-terminated UTF-8 input string
#[derive(Debug)]
pub struct InputBuffer {
    inner: CString,
}

impl InputBuffer {
    /// Marshal `text` for a native call
    ///
    /// Text with an interior NUL byte cannot be represented and is rejected.
    pub fn new(text: &str) -> BridgeResult<Self> {
        CString::new(text)
            .map(|inner| Self { inner })
            .map_err(|e| {
                BridgeError::InvalidInput(format!(
                    "input contains a NUL byte at position {}",
                    e.nul_position()
                ))
            })
    }

    /// Pointer valid for as long as this buffer is alive
    pub fn as_ptr(&self) -> *const c_char {
        self.inner.as_ptr()
    }

    /// Length in bytes, excluding the terminator
    pub fn len(&self) -> usize {
        self.inner.as_bytes().len()
    }

    /// Check if the buffer holds the empty string
    pub fn is_empty(&self) -> bool {
        self.inner.as_bytes().is_empty()
    }
}

/// A native-allocated string, released through its free function on drop
pub struct NativeString {
    ptr: *mut c_char,
    free: FreeStringFn,
}

impl NativeString {
    /// Take ownership of a native string
    ///
    /// Returns `None` for null; null is never passed to `free`.
    ///
    /// # Safety
    /// `ptr` must be null or a NUL-terminated string that `free` releases,
    /// and nothing else may release it.
    pub unsafe fn from_raw(ptr: *const c_char, free: FreeStringFn) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self {
                ptr: ptr.cast_mut(),
                free,
            })
        }
    }

    /// Copy the contents into an owned string
    pub fn copy_text(&self) -> BridgeResult<String> {
        // SAFETY: ptr is a live NUL-terminated string until drop
        let text = unsafe { CStr::from_ptr(self.ptr) }.to_str()?;
        Ok(text.to_owned())
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        // SAFETY: from_raw's contract makes this the single release
        unsafe { (self.free)(self.ptr) };
    }
}

impl std::fmt::Debug for NativeString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeString").field("ptr", &self.ptr).finish()
    }
}

#[cfg(test)]
#[path = "buffer/buffer_tests.rs"]
mod buffer_tests;
