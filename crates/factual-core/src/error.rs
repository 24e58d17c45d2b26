//! Error types for Factual request building.
//!
//! Building a request performs no I/O, so every error here is local and
//! synchronous. None of them are transient and none should be retried.

use thiserror::Error;

/// Main error type for request building.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A parameter value could not be encoded for transport
    #[error("Encoding failure: {0}")]
    Encoding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Specialized result type for request building.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "ENCODING_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// Returns true if this error indicates a programming or environment
    /// fault rather than bad caller input.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::Config(_))
    }
}

// Conversions from external error types
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::Encoding("test".to_string()).error_code(),
            "ENCODING_FAILURE"
        );
        assert_eq!(Error::Config("test".to_string()).error_code(), "CONFIG_ERROR");
        assert_eq!(
            Error::InvalidUrl("test".to_string()).error_code(),
            "INVALID_URL"
        );
        assert_eq!(
            Error::InvalidRequest("test".to_string()).error_code(),
            "INVALID_REQUEST"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::Encoding("key must be a string".to_string());
        assert_eq!(err.to_string(), "Encoding failure: key must be a string");

        let err = Error::InvalidRequest("table name is empty".to_string());
        assert_eq!(err.to_string(), "Invalid request: table name is empty");
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::Encoding("test".to_string()).is_fatal());
        assert!(Error::Config("test".to_string()).is_fatal());
        assert!(!Error::InvalidUrl("test".to_string()).is_fatal());
        assert!(!Error::InvalidRequest("test".to_string()).is_fatal());
    }

    #[test]
    fn test_from_serde_json_error() {
        // Maps with non-string keys cannot become JSON objects.
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        let err = serde_json::to_value(&map).unwrap_err();
        let factual_err: Error = err.into();
        assert!(matches!(factual_err, Error::Encoding(_)));
    }

    #[test]
    fn test_from_validation_error() {
        use validator::Validate;

        let config = crate::DriverConfig {
            base_url: "not a url".to_string(),
            url_encode: true,
        };
        let err = config.validate().unwrap_err();
        let factual_err: Error = err.into();
        assert!(matches!(factual_err, Error::Config(_)));
        assert_eq!(factual_err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let factual_err: Error = err.into();
        assert!(matches!(factual_err, Error::InvalidUrl(_)));
    }
}
