//! `tracing` layer feeding the host log sink

use crate::level::{level_filter, register_filter};
use crate::sink::LogSink;
use asyncffi_core::LogLevel;
use std::fmt::{self, Write as _};
use std::sync::Once;
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Forwards each `tracing` event the sink accepts to the host callback
///
/// The event text is its `message` followed by its other fields as
/// ` key=value` pairs.
pub struct CallbackLayer {
    sink: &'static LogSink,
}

impl CallbackLayer {
    /// A layer over the global sink
    pub fn new() -> Self {
        Self {
            sink: LogSink::global(),
        }
    }

    fn log_level(level: &Level) -> LogLevel {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl Default for CallbackLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Subscriber> Layer<S> for CallbackLayer {
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // The host may change the level at any time; never cache a verdict
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.sink.accepts(Self::log_level(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut text = EventText::default();
        event.record(&mut text);

        self.sink.emit(
            Self::log_level(metadata.level()),
            metadata.target(),
            &text.finish(),
        );
    }
}

#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
}

impl EventText {
    fn finish(self) -> String {
        if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for EventText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

static INSTALL: Once = Once::new();

/// Route the native library's `tracing` output to the host log callback
///
/// The first call tries to install a global subscriber made of a reloadable
/// level filter and a [`CallbackLayer`]. If the process already has a global
/// subscriber, that one keeps receiving events and nothing reaches the host
/// callback. Every call sets the level.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::prelude::*;

    INSTALL.call_once(|| {
        let (filter, handle) = tracing_subscriber::reload::Layer::new(level_filter(level));
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(CallbackLayer::new());

        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            register_filter(handle);
        }
    });

    crate::set_log_level(level);
}
