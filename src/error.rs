//! Error types and handling for the Surgeboard dashboard

use thiserror::Error;

/// Main error type for the Surgeboard dashboard
///
/// The taxonomy is deliberately coarse: a missing credential blocks the
/// data-dependent views, any transport/HTTP/parse failure collapses into
/// `Fetch` so a single panel can show a warning, and empty result sets are
/// never errors.
#[derive(Error, Debug)]
pub enum SurgeboardError {
    /// Configuration-related errors (missing or invalid credential)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External API communication errors (network, HTTP status, parse, timeout)
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl SurgeboardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a one-line operator-facing warning message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SurgeboardError::Config { .. } => {
                "Please set an events API token to load dashboard data.".to_string()
            }
            SurgeboardError::Fetch { .. } => {
                "Unable to reach the events API. Adjust a control to retry.".to_string()
            }
            SurgeboardError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SurgeboardError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            SurgeboardError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = SurgeboardError::config("missing API token");
        assert!(matches!(config_err, SurgeboardError::Config { .. }));

        let fetch_err = SurgeboardError::fetch("connection refused");
        assert!(matches!(fetch_err, SurgeboardError::Fetch { .. }));

        let validation_err = SurgeboardError::validation("unknown location");
        assert!(matches!(validation_err, SurgeboardError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = SurgeboardError::config("test");
        assert!(config_err.user_message().contains("API token"));

        let fetch_err = SurgeboardError::fetch("test");
        assert!(fetch_err.user_message().contains("Unable to reach"));

        let validation_err = SurgeboardError::validation("bad radius");
        assert!(validation_err.user_message().contains("bad radius"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SurgeboardError = io_err.into();
        assert!(matches!(err, SurgeboardError::Io { .. }));
    }
}
