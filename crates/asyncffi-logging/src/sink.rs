//! Host log sink: the callback and level chosen by the host application

use asyncffi_core::LogLevel;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::ffi::{CString, c_char};

/// Host function that receives native log records
///
/// `level` uses the [`LogLevel`] numbering (0 = trace .. 4 = error).
/// `target` and `message` are NUL-terminated UTF-8 owned by the library and
/// valid only for the duration of the call.
pub type LogCallback = extern "C" fn(level: u8, target: *const c_char, message: *const c_char);

static GLOBAL: OnceCell<LogSink> = OnceCell::new();

#[derive(Clone, Copy)]
struct SinkState {
    callback: Option<LogCallback>,
    level: LogLevel,
}

/// Where native log records go once they pass the level check
///
/// Callback and level are swapped together so a record is never checked
/// against one host's level and delivered to another host's callback.
pub struct LogSink {
    state: RwLock<SinkState>,
}

impl LogSink {
    /// A sink with no callback, accepting `Info` and above
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SinkState {
                callback: None,
                level: LogLevel::Info,
            }),
        }
    }

    /// The sink the native library logs to
    pub fn global() -> &'static LogSink {
        GLOBAL.get_or_init(LogSink::new)
    }

    /// Install or remove the host callback
    pub fn set_callback(&self, callback: Option<LogCallback>) {
        self.state.write().callback = callback;
    }

    pub fn callback(&self) -> Option<LogCallback> {
        self.state.read().callback
    }

    pub fn set_level(&self, level: LogLevel) {
        self.state.write().level = level;
    }

    pub fn level(&self) -> LogLevel {
        self.state.read().level
    }

    /// Whether a record at `level` would reach the host
    ///
    /// `Off` is a threshold only; no record is ever emitted at that level.
    pub fn accepts(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Hand one record to the host callback
    ///
    /// Returns `true` if the callback was invoked.
    pub fn emit(&self, level: LogLevel, target: &str, message: &str) -> bool {
        let SinkState {
            callback,
            level: threshold,
        } = *self.state.read();

        let Some(callback) = callback else {
            return false;
        };
        if level == LogLevel::Off || level < threshold {
            return false;
        }

        let target = c_text(target);
        let message = c_text(message);
        callback(level as u8, target.as_ptr(), message.as_ptr());
        true
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// NUL-terminated copy of `text`; interior NULs become `?`
fn c_text(text: &str) -> CString {
    CString::new(text.replace('\0', "?")).unwrap_or_default()
}
