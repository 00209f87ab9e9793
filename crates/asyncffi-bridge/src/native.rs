//! The native function table
//!
//! Everything the bridge needs from the native library, as plain function
//! pointers. [`NativeApi::linked`] binds the statically linked
//! `asyncffi-native`; [`NativeLibrary::load`] binds a shared library at
//! runtime; tests build tables out of mock functions.

use asyncffi_core::{BridgeError, BridgeResult};
use libloading::{Library, Symbol};
use std::ffi::{OsStr, c_char, c_void};

pub use asyncffi_native::{ResultCallback, ResultOrErrorCallback};

/// `init_async_runtime`
pub type InitFn = unsafe extern "C" fn() -> bool;

/// `init_async_runtime_with_config`
pub type InitWithConfigFn = unsafe extern "C" fn(config_json: *const u8, config_len: usize) -> bool;

/// `cleanup_async_runtime`
pub type CleanupFn = unsafe extern "C" fn();

/// `say_hello_async`
pub type ResultOnlyEntryFn = unsafe extern "C" fn(
    who: *const c_char,
    samples: usize,
    callback: Option<ResultCallback>,
    token: *mut c_void,
) -> bool;

/// `say_hello_async_with_error`
pub type ResultOrErrorEntryFn = unsafe extern "C" fn(
    who: *const c_char,
    samples: usize,
    callback: Option<ResultOrErrorCallback>,
    token: *mut c_void,
) -> bool;

/// `free_rust_string`
pub type FreeStringFn = unsafe extern "C" fn(ptr: *mut c_char);

/// Function pointers into one native library
#[derive(Clone, Copy)]
pub struct NativeApi {
    pub init: InitFn,
    /// Optional: libraries without it can only start with defaults
    pub init_with_config: Option<InitWithConfigFn>,
    pub cleanup: CleanupFn,
    pub say_hello: ResultOnlyEntryFn,
    pub say_hello_with_error: ResultOrErrorEntryFn,
    pub free_string: FreeStringFn,
}

impl NativeApi {
    /// The statically linked `asyncffi-native` library
    pub fn linked() -> Self {
        Self {
            init: asyncffi_native::init_async_runtime,
            init_with_config: Some(asyncffi_native::init_async_runtime_with_config),
            cleanup: asyncffi_native::cleanup_async_runtime,
            say_hello: asyncffi_native::say_hello_async,
            say_hello_with_error: asyncffi_native::say_hello_async_with_error,
            free_string: asyncffi_native::free_rust_string,
        }
    }
}

impl std::fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeApi")
            .field("init", &(self.init as *const ()))
            .field("cleanup", &(self.cleanup as *const ()))
            .field("say_hello", &(self.say_hello as *const ()))
            .field("say_hello_with_error", &(self.say_hello_with_error as *const ()))
            .field("free_string", &(self.free_string as *const ()))
            .finish_non_exhaustive()
    }
}

/// A native library loaded at runtime
///
/// The function table is only valid while the library stays loaded, so the
/// table is never handed out by value.
pub struct NativeLibrary {
    api: NativeApi,
    // Must outlive every use of `api`
    _library: Library,
}

impl NativeLibrary {
    /// Load a shared library and resolve every required symbol
    ///
    /// A missing library or symbol is a [`BridgeError::RuntimeInitError`].
    ///
    /// # Safety
    /// Loading runs the library's initialisers, and the resolved symbols are
    /// trusted to have the signatures declared in this module.
    pub unsafe fn load(path: impl AsRef<OsStr>) -> BridgeResult<Self> {
        let path = path.as_ref();
        // SAFETY: caller vouches for the library
        let library = unsafe { Library::new(path) }.map_err(|e| {
            BridgeError::RuntimeInitError(format!("failed to load {}: {}", path.display(), e))
        })?;

        // SAFETY: caller vouches for the symbol signatures
        let api = unsafe {
            NativeApi {
                init: *required::<InitFn>(&library, b"init_async_runtime\0")?,
                init_with_config: library
                    .get::<InitWithConfigFn>(b"init_async_runtime_with_config\0")
                    .ok()
                    .map(|symbol| *symbol),
                cleanup: *required::<CleanupFn>(&library, b"cleanup_async_runtime\0")?,
                say_hello: *required::<ResultOnlyEntryFn>(&library, b"say_hello_async\0")?,
                say_hello_with_error: *required::<ResultOrErrorEntryFn>(
                    &library,
                    b"say_hello_async_with_error\0",
                )?,
                free_string: *required::<FreeStringFn>(&library, b"free_rust_string\0")?,
            }
        };

        tracing::debug!("Loaded native library {}", path.display());
        Ok(Self {
            api,
            _library: library,
        })
    }

    /// The library's function table
    pub fn api(&self) -> &NativeApi {
        &self.api
    }
}

/// # Safety
/// `T` must match the symbol's real signature.
unsafe fn required<'lib, T>(library: &'lib Library, name: &[u8]) -> BridgeResult<Symbol<'lib, T>> {
    // SAFETY: forwarded to the caller
    unsafe { library.get::<T>(name) }.map_err(|e| {
        let name = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        BridgeError::RuntimeInitError(format!("missing symbol {}: {}", name, e))
    })
}
