//! Log sink writing to the devtools console.

use turbo_bridge::logging::{LogEntry, LogLevel, LogSink};
use wasm_bindgen::JsValue;
use web_sys::console;

/// Routes each entry to the console method matching its level.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, entry: &LogEntry, rendered: &str) {
        let line = JsValue::from_str(rendered);
        match entry.level {
            LogLevel::Trace | LogLevel::Debug => console::debug_1(&line),
            LogLevel::Info => console::log_1(&line),
            LogLevel::Warn => console::warn_1(&line),
            LogLevel::Error => console::error_1(&line),
        }
    }
}
