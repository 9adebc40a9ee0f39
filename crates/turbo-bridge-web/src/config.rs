//! Configuration passed to `start`.

use turbo_bridge::{BridgeConfig, BridgeResult};

/// Resolve the JSON text handed to `start`. Absent, blank or `null`
/// configuration means defaults.
pub fn start_config(json: Option<&str>) -> BridgeResult<BridgeConfig> {
    match json.map(str::trim) {
        None | Some("") | Some("null") => Ok(BridgeConfig::default()),
        Some(json) => BridgeConfig::from_json(json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use turbo_bridge::BridgeError;

    #[test]
    fn test_missing_config_uses_defaults() {
        assert_eq!(start_config(None).unwrap(), BridgeConfig::default());
        assert_eq!(start_config(Some("null")).unwrap(), BridgeConfig::default());
        assert_eq!(start_config(Some("  ")).unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = start_config(Some(r#"{"editCursor": "pointer"}"#)).unwrap();

        assert_eq!(config.edit_cursor, "pointer");
        assert_eq!(config.scroll_debounce_ms, 10);
    }

    #[test]
    fn test_invalid_config() {
        let err = start_config(Some(r#"{"maxSelectorDepth": 0}"#)).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
