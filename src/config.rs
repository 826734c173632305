//! Configuration for the generation client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use log::debug;

/// Model used for [`crate::QualityMode::Fast`]
pub const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash";
/// Model used for [`crate::QualityMode::Thorough`]
pub const DEFAULT_THOROUGH_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variables searched, in order, for the provider key
pub const CREDENTIAL_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// How JSON is dug out of raw model text
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default
)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy
{   /// First opening bracket to last closing bracket
    Outermost
  , /// First complete top-level value, nesting and strings aware
    #[default]
    Balanced
}

/// Where the provider credential comes from.
/// Resolved on every call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource
{   /// First non-empty variable wins
    Environment(Vec<String>)
  , Fixed(String)
  , Absent
}

impl CredentialSource
{   /// Read the credential now
    pub fn resolve(&self) -> Option<String>
    {   match self
        {   CredentialSource::Environment(vars) => {
              vars.iter()
                .filter_map(|v| std::env::var(v).ok())
                .map(|k| k.trim().to_string())
                .find(|k| !k.is_empty())
            }
          , CredentialSource::Fixed(key) => {
              let key = key.trim();
              if key.is_empty() { None } else { Some(key.to_string()) }
            }
          , CredentialSource::Absent => None
        }
    }
}

impl Default for CredentialSource
{   fn default() -> Self
    {   CredentialSource::Environment(
          CREDENTIAL_ENV_VARS.iter().map(|v| v.to_string()).collect()
        )
    }
}

/// Generation client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig
{   /// Model for fast requests
    pub fast_model: String
  , /// Model for thorough requests
    pub thorough_model: String
  , /// Provider API base URL
    pub api_base: String
  , /// Request timeout in seconds
    pub timeout_secs: u64
  , /// Extra timeout in milliseconds, mainly for tests
    pub timeout_millis: u64
  , /// JSON recovery routine
    pub recovery: RecoveryStrategy
  , /// Check decoded JSON against the shape descriptor
    pub validate_shapes: bool
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   fast_model: DEFAULT_FAST_MODEL.to_string()
          , thorough_model: DEFAULT_THOROUGH_MODEL.to_string()
          , api_base: DEFAULT_API_BASE.to_string()
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , timeout_millis: 0
          , recovery: RecoveryStrategy::default()
          , validate_shapes: false
        }
    }
}

impl ClientConfig
{   /// Total wall-clock budget for one provider call
    pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
          + Duration::from_millis(self.timeout_millis)
    }

    /// Model identifier for a quality mode
    pub fn model_for(&self, quality: crate::QualityMode) -> &str
    {   match quality
        {   crate::QualityMode::Fast => self.fast_model.as_str()
          , crate::QualityMode::Thorough => self.thorough_model.as_str()
        }
    }

    /// Parse a JSON document; missing fields take defaults
    pub fn from_json_str(s: &str)
      -> Result<Self, crate::error::Error>
    {   let config: ClientConfig = serde_json::from_str(s)
          .map_err(|e| crate::error::Error::InvalidConfiguration(
            e.to_string()
          ))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading client config from {}", path.display());
        let raw = std::fs::read_to_string(path)
          .map_err(|e| crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          ))?;
        Self::from_json_str(&raw)
    }

    /// Overlay `STRATAGEM_*` environment variables
    pub fn with_env_overrides(self)
      -> Result<Self, crate::error::Error>
    {   self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from any lookup, keyed by env var name
    pub fn with_overrides<F>(mut self, lookup: F)
      -> Result<Self, crate::error::Error>
    where F: Fn(&str) -> Option<String>
    {   if let Some(model) = lookup("STRATAGEM_FAST_MODEL")
        {   self.fast_model = model;
        }
        if let Some(model) = lookup("STRATAGEM_THOROUGH_MODEL")
        {   self.thorough_model = model;
        }
        if let Some(base) = lookup("STRATAGEM_API_BASE")
        {   self.api_base = base;
        }
        if let Some(secs) = lookup("STRATAGEM_TIMEOUT_SECS")
        {   self.timeout_secs = secs.trim().parse()
              .map_err(|_| crate::error::Error::InvalidConfiguration(
                format!("STRATAGEM_TIMEOUT_SECS is not a number: {}", secs)
              ))?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.fast_model.trim().is_empty()
          || self.thorough_model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "model identifiers must not be empty".to_string()
            ));
        }
        if self.timeout().is_zero()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "timeout must be greater than zero".to_string()
            ));
        }
        Ok(())
    }
}
