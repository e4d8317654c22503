//! Error types for OpsDeck

use thiserror::Error;

/// Result type alias using OpsDeck's Error
pub type Result<T> = std::result::Result<T, Error>;

/// OpsDeck core error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Payload errors (E700-E799)
    #[error("Invalid authorized menu payload: {0}")]
    InvalidPayload(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "E600",
            Self::InvalidPayload(_) => "E700",
            Self::InvalidInput(_) => "E800",
            Self::Json(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ConfigError(_) => Some("opsdeck config list".to_string()),
            Self::InvalidPayload(_) => {
                Some("Check the payload against GET /api/v1/menus/user".to_string())
            }
            _ => None,
        }
    }
}
