//! Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::logging::{LogFormat, LogLevel, StructuredLogger};

/// Visual appearance of the highlight overlay.
///
/// Positioning, pointer transparency and stacking are fixed by the
/// overlay controller and cannot be overridden here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    pub border: String,
    pub background: String,
    pub box_shadow: String,
    pub transition: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            border: "2px solid #3b82f6".to_string(),
            background: "rgba(59, 130, 246, 0.15)".to_string(),
            box_shadow: "0 0 0 9999px rgba(0, 0, 0, 0.1)".to_string(),
            transition: "all 0.1s ease".to_string(),
        }
    }
}

/// Configuration for a bridge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Quiet period before a scroll burst repositions the overlay.
    pub scroll_debounce_ms: u64,
    /// Maximum number of path fragments in a generated selector.
    pub max_selector_depth: usize,
    /// Maximum number of class names per path fragment.
    pub max_selector_classes: usize,
    /// Number of characters of text content reported in element info.
    pub text_preview_chars: usize,
    /// Body cursor while edit mode is active.
    pub edit_cursor: String,
    /// Overlay appearance.
    pub overlay: OverlayStyle,
    /// Minimum log level.
    pub log_level: LogLevel,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scroll_debounce_ms: 10,
            max_selector_depth: 10,
            max_selector_classes: 2,
            text_preview_chars: 100,
            edit_cursor: "crosshair".to_string(),
            overlay: OverlayStyle::default(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Human,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let config: BridgeConfig =
            serde_json::from_str(json).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the scroll debounce window in milliseconds.
    pub fn with_scroll_debounce_ms(mut self, ms: u64) -> Self {
        self.scroll_debounce_ms = ms;
        self
    }

    /// Set the selector depth cap.
    pub fn with_max_selector_depth(mut self, depth: usize) -> Self {
        self.max_selector_depth = depth;
        self
    }

    /// Set the per-fragment class cap.
    pub fn with_max_selector_classes(mut self, classes: usize) -> Self {
        self.max_selector_classes = classes;
        self
    }

    /// Set the text preview length.
    pub fn with_text_preview_chars(mut self, chars: usize) -> Self {
        self.text_preview_chars = chars;
        self
    }

    /// Set the edit mode cursor.
    pub fn with_edit_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.edit_cursor = cursor.into();
        self
    }

    /// Set the overlay style.
    pub fn with_overlay(mut self, overlay: OverlayStyle) -> Self {
        self.overlay = overlay;
        self
    }

    /// Set the minimum log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the log format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// The scroll debounce window.
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    /// Build a logger honoring the configured level and format.
    pub fn logger(&self, source: impl Into<String>) -> StructuredLogger {
        StructuredLogger::new(source)
            .with_min_level(self.log_level)
            .with_format(self.log_format)
    }

    /// Check invariants.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.max_selector_depth == 0 {
            return Err(BridgeError::Config(
                "maxSelectorDepth must be at least 1".to_string(),
            ));
        }
        if self.edit_cursor.trim().is_empty() {
            return Err(BridgeError::Config("editCursor must not be empty".to_string()));
        }
        Ok(())
    }
}
