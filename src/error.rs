//! Error types and handling for the weather alert pipeline

use thiserror::Error;

/// Main error type for the weather alert pipeline
#[derive(Error, Debug)]
pub enum AlertError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather provider errors (bad status, malformed payload)
    #[error("Weather API error: {message}")]
    Weather { message: String },

    /// Reverse geocoding errors
    #[error("Geocoding error: {message}")]
    Geocoding { message: String },

    /// Message delivery errors
    #[error("Delivery error: {message}")]
    Delivery { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Transport-level HTTP errors, timeouts included
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
}

impl AlertError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new weather provider error
    pub fn weather<S: Into<String>>(message: S) -> Self {
        Self::Weather {
            message: message.into(),
        }
    }

    /// Create a new geocoding error
    pub fn geocoding<S: Into<String>>(message: S) -> Self {
        Self::Geocoding {
            message: message.into(),
        }
    }

    /// Create a new delivery error
    pub fn delivery<S: Into<String>>(message: S) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the underlying request ran out of time
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, AlertError::Http { source } if source.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AlertError::config("missing access token");
        assert!(matches!(config_err, AlertError::Config { .. }));

        let weather_err = AlertError::weather("status 500");
        assert!(matches!(weather_err, AlertError::Weather { .. }));

        let validation_err = AlertError::validation("bad phone number");
        assert!(matches!(validation_err, AlertError::Validation { .. }));
    }

    #[test]
    fn test_display_includes_message() {
        let err = AlertError::delivery("API error 131026: Message undeliverable");
        assert_eq!(
            err.to_string(),
            "Delivery error: API error 131026: Message undeliverable"
        );
        assert!(!err.is_timeout());
    }
}
