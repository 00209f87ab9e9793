//! The process-wide execution engine behind the exported functions

use asyncffi_core::{BridgeResult, RuntimeConfig};
use asyncffi_runtime::{EngineSlot, NativeEngine};
use once_cell::sync::OnceCell;

/// Get the global engine slot
pub(crate) fn engine() -> &'static EngineSlot {
    static ENGINE: OnceCell<EngineSlot> = OnceCell::new();
    ENGINE.get_or_init(EngineSlot::new)
}

/// Start the engine; a second start keeps the running engine
///
/// Returns `true` if this call created the engine. Fails with
/// `RuntimeShutdownError` once the engine has been stopped.
pub(crate) fn start(config: RuntimeConfig) -> BridgeResult<bool> {
    let created = engine().start(config)?;
    if created {
        tracing::info!("Async runtime initialized");
    } else {
        tracing::debug!("Async runtime already initialized");
    }
    Ok(created)
}

/// Stop the engine, waiting for in-flight completions to be delivered
///
/// Returns `false` if no engine was running.
pub(crate) fn stop() -> bool {
    let stopped = engine().stop();
    if !stopped {
        tracing::debug!("Cleanup requested with no runtime running");
    }
    stopped
}

/// Run `f` against the engine if it is accepting work
pub(crate) fn with_engine<F, R>(f: F) -> BridgeResult<R>
where
    F: FnOnce(&NativeEngine) -> R,
{
    engine().with(f)
}
