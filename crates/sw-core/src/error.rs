//! Error types for sw-core

use thiserror::Error;

/// Main error type for sw-core
///
/// Every transport maps these variants onto its own failure shape; the HTTP API
/// answers `400` for [`Error::Validation`] and `500` for everything else.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed caller input. Raised before any provider call.
    #[error("{0}")]
    Validation(String),

    /// Missing calendar id, credentials or an unusable setting.
    #[error("{0}")]
    Configuration(String),

    /// The calendar provider failed (auth, network, invalid calendar, quota).
    #[error("{0}")]
    Upstream(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Helper to create validation errors
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Helper to create configuration errors
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Helper to create upstream errors
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Whether the error was caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for sw-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_message_through() {
        let err = Error::upstream("Not Found");
        assert_eq!(err.to_string(), "Not Found");

        let err = Error::validation("start must be before end");
        assert_eq!(err.to_string(), "start must be before end");
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::validation("bad").is_validation());
        assert!(!Error::configuration("GOOGLE_CALENDAR_ID is not set").is_validation());
        assert!(!Error::upstream("quota").is_validation());
    }
}
