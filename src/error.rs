//! Error types and handling for the `IcyRoute` service

use thiserror::Error;

/// Main error type for route planning
#[derive(Error, Debug)]
pub enum IcyRouteError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl IcyRouteError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
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

    /// Stable machine-readable code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            IcyRouteError::Config { .. } => "config",
            IcyRouteError::Validation { .. } => "invalid_request",
            IcyRouteError::General { .. } => "internal",
        }
    }

    /// Whether the error was caused by the client request
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, IcyRouteError::Validation { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            IcyRouteError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            IcyRouteError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            IcyRouteError::General { .. } => {
                "Route analysis failed unexpectedly. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = IcyRouteError::config("missing API key");
        assert!(matches!(config_err, IcyRouteError::Config { .. }));
        assert!(!config_err.is_client_error());

        let validation_err = IcyRouteError::validation("origin is required");
        assert!(matches!(validation_err, IcyRouteError::Validation { .. }));
        assert!(validation_err.is_client_error());
        assert_eq!(validation_err.code(), "invalid_request");
    }

    #[test]
    fn test_user_messages() {
        let config_err = IcyRouteError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let validation_err = IcyRouteError::validation("destination is required");
        assert!(validation_err.user_message().contains("destination is required"));

        // internal details never reach the client
        let general_err = IcyRouteError::general("index out of bounds in aggregator");
        assert!(!general_err.user_message().contains("aggregator"));
        assert_eq!(general_err.code(), "internal");
    }
}
