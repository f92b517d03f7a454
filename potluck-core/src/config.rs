//! Engine configuration from environment variables.

use std::env;
use thiserror::Error;

use crate::filter::FilterMode;
use crate::store::DEFAULT_MAX_COMMENT_CHARS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

/// Interaction engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether browse categories match recipe tags or regions.
    pub filter_mode: FilterMode,
    /// Longest comment accepted, in characters.
    pub max_comment_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Tag,
            max_comment_chars: DEFAULT_MAX_COMMENT_CHARS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `POTLUCK_FILTER_MODE`: "tag" or "region" (default: "tag")
    /// - `POTLUCK_MAX_COMMENT_CHARS`: comment length limit (default: 2000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("POTLUCK_FILTER_MODE") {
            config.filter_mode =
                FilterMode::parse(&value).ok_or_else(|| invalid("POTLUCK_FILTER_MODE", &value))?;
        }

        if let Some(value) = lookup("POTLUCK_MAX_COMMENT_CHARS") {
            config.max_comment_chars = value
                .trim()
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or_else(|| invalid("POTLUCK_MAX_COMMENT_CHARS", &value))?;
        }

        Ok(config)
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    }
}
