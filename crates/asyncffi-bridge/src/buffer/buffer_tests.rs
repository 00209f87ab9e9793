#![allow(non_snake_case)]

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

// One counter per test so parallel tests do not see each other's frees
static FREED: AtomicUsize = AtomicUsize::new(0);
static FREED_INVALID: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn counting_free(ptr: *mut c_char) {
    FREED.fetch_add(1, Ordering::SeqCst);
    drop(unsafe { CString::from_raw(ptr) });
}

unsafe extern "C" fn counting_free_invalid(ptr: *mut c_char) {
    FREED_INVALID.fetch_add(1, Ordering::SeqCst);
    drop(unsafe { CString::from_raw(ptr) });
}

fn native(text: &[u8]) -> *const c_char {
    CString::new(text).unwrap().into_raw()
}

#[test]
fn InputBuffer___plain_text___nul_terminated() {
    let buffer = InputBuffer::new("Stephen").unwrap();

    let read_back = unsafe { CStr::from_ptr(buffer.as_ptr()) };

    assert_eq!(read_back.to_str().unwrap(), "Stephen");
    assert_eq!(buffer.len(), 7);
    assert!(!buffer.is_empty());
}

#[test]
fn InputBuffer___empty_text___allowed() {
    let buffer = InputBuffer::new("").unwrap();

    assert!(buffer.is_empty());
}

#[test]
fn InputBuffer___interior_nul___invalid_input() {
    let result = InputBuffer::new("Ste\0phen");

    match result {
        Err(BridgeError::InvalidInput(message)) => assert!(message.contains("position 3")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn NativeString___null___not_wrapped() {
    let wrapped = unsafe { NativeString::from_raw(std::ptr::null(), counting_free) };

    assert!(wrapped.is_none());
}

#[test]
fn NativeString___lifecycle___copies_then_frees_once() {
    let text = {
        let wrapped = unsafe { NativeString::from_raw(native(b"Hello, Stephen!"), counting_free) }
            .unwrap();
        let text = wrapped.copy_text().unwrap();
        assert_eq!(FREED.load(Ordering::SeqCst), 0);
        text
    };

    assert_eq!(text, "Hello, Stephen!");
    assert_eq!(FREED.load(Ordering::SeqCst), 1);
}

#[test]
fn NativeString___invalid_utf8___decode_error_and_still_freed() {
    let result =
        unsafe { NativeString::from_raw(native(&[0x48, 0xff, 0x69]), counting_free_invalid) }
            .unwrap()
            .copy_text();

    assert!(matches!(result, Err(BridgeError::DecodeError(_))));
    assert_eq!(FREED_INVALID.load(Ordering::SeqCst), 1);
}
