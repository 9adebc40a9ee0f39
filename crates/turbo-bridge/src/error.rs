//! Error types for the visual-edit bridge.

use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while the bridge talks to its host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The selector could not be parsed by the host document.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A DOM operation failed.
    #[error("DOM error: {0}")]
    Dom(String),

    /// Posting to or listening on the parent frame failed.
    #[error("Channel error: {0}")]
    Channel(String),

    /// A message did not match the wire protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Scheduling or cancelling a timer failed.
    #[error("Timer error: {0}")]
    Timer(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::InvalidSelector("div >".to_string());
        assert_eq!(err.to_string(), "Invalid selector: div >");
    }

    #[test]
    fn test_from_serde_error() {
        let parse: Result<u32, _> = serde_json::from_str("\"nope\"");
        let err: BridgeError = parse.unwrap_err().into();
        assert!(matches!(err, BridgeError::Protocol(_)));
    }
}
