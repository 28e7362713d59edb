//! Error types for sw-calendar

use thiserror::Error;

/// sw-calendar error type
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Service-account key missing, unreadable or malformed
    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success answer from the calendar API; the provider message is kept as-is
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The free/busy answer flagged the calendar itself, e.g. `notFound`
    #[error("Calendar '{calendar_id}' could not be queried: {reasons}")]
    CalendarUnavailable { calendar_id: String, reasons: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<CalendarError> for sw_core::Error {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::Configuration(_) | CalendarError::Credentials(_) => {
                sw_core::Error::configuration(err.to_string())
            }
            other => sw_core::Error::upstream(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CalendarError>;
