//! Driver configuration.
//!
//! Controls where assembled read requests point and how their query strings
//! are rendered.

use crate::Error;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// Default base URL of the Factual read API.
pub const DEFAULT_BASE_URL: &str = "https://api.v3.factual.com";

/// Configuration for a Factual driver instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DriverConfig {
    /// API base URL
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whether query values are percent-encoded when rendered
    #[serde(default = "default_url_encode")]
    pub url_encode: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_url_encode() -> bool {
    true
}

impl DriverConfig {
    /// Create a new configuration for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL fails validation.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            url_encode: default_url_encode(),
        };

        config
            .validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Parse a configuration from JSON, applying defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| Error::Config(format!("Invalid configuration JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Set whether query values are percent-encoded.
    #[must_use]
    pub const fn with_url_encode(mut self, url_encode: bool) -> Self {
        self.url_encode = url_encode;
        self
    }

    /// Parse the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid base URL: {e}")))
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            url_encode: default_url_encode(),
        }
    }
}
