#![forbid(unsafe_code)]

//! Scheduler configuration.
//!
//! The only knob is the strategy consumers start with. With the
//! `policy-config` feature the configuration can be read from TOML:
//!
//! ```toml
//! default_strategy = "local"
//! ```

use crate::error::RenderError;
#[cfg(feature = "policy-config")]
use crate::error::ConfigError;
use crate::strategy::{DEFAULT_STRATEGY_NAME, StrategyName};

/// Scheduler-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Strategy a consumer uses until it selects another.
    pub default_strategy: StrategyName,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_strategy: DEFAULT_STRATEGY_NAME,
        }
    }
}

impl SchedulerConfig {
    /// Replace the default strategy.
    #[must_use]
    pub fn with_default_strategy(mut self, name: StrategyName) -> Self {
        self.default_strategy = name;
        self
    }

    /// Configuration whose default strategy is called `name`.
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        Ok(Self::default().with_default_strategy(name.parse()?))
    }

    /// Parse a TOML document.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Read and parse a TOML file.
    #[cfg(feature = "policy-config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), strategy = %config.default_strategy, "loaded scheduler config");
        Ok(config)
    }
}
