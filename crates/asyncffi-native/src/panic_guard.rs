//! Panic handling for FFI boundaries
//!
//! No panic may unwind out of an exported function. Every entry point runs its
//! body through [`catch_panic`] and turns a caught panic into the failure value
//! of that entry point (`false`, an error callback, or a no-op).

use std::any::Any;
use std::panic;
use std::sync::Once;

/// Run `f`, converting a panic into its message
pub(crate) fn catch_panic<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R + panic::UnwindSafe,
{
    panic::catch_unwind(f).map_err(|payload| {
        let message = panic_to_string(payload.as_ref());
        tracing::error!("FFI panic caught: {}", message);
        message
    })
}

/// Convert a panic payload to a human-readable string
pub(crate) fn panic_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("native code panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("native code panicked: {}", s)
    } else {
        "native code panicked with unknown payload".to_string()
    }
}

static HOOK: Once = Once::new();

/// Install a panic hook that reports panics through tracing
///
/// Installed once per process. The previous hook still runs after ours so a
/// host that links this library statically keeps its own panic output.
pub(crate) fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let payload = panic_to_string(info.payload());
            match info.location() {
                Some(location) => tracing::error!(
                    "PANIC at {}:{}:{}: {}",
                    location.file(),
                    location.line(),
                    location.column(),
                    payload
                ),
                None => tracing::error!("PANIC at unknown location: {}", payload),
            }
            previous(info);
        }));
    });
}
