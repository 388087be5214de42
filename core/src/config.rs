//! Client configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! base_url = "http://localhost:3030"
//! session_key = "user"
//!
//! [summary]
//! min = 10
//! max = 1000
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ApiError;
use crate::session::DEFAULT_SESSION_KEY;
use crate::validate::LengthBounds;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_key: String,
    /// Accepted summary length, in characters, for the book forms.
    pub summary: LengthBounds,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3030".to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            summary: LengthBounds::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ApiError> {
        let config: Self = toml::from_str(raw).map_err(|e| ApiError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| ApiError::Config(e.to_string()))?;
        Self::from_toml_str(&raw)
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".to_string()));
        }
        if self.summary.min > self.summary.max {
            return Err(ApiError::Config(format!(
                "summary.min ({}) exceeds summary.max ({})",
                self.summary.min, self.summary.max
            )));
        }
        Ok(())
    }
}
