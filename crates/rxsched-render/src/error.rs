#![forbid(unsafe_code)]

//! Errors raised at the configuration boundary.

use std::fmt;

/// Error type for strategy selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The name does not match any strategy.
    UnknownStrategy(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStrategy(name) => write!(
                f,
                "unknown render strategy `{name}` (expected one of noop, native, global, local, detach)"
            ),
        }
    }
}

impl std::error::Error for RenderError {}

/// Error type for loading a [`SchedulerConfig`](crate::SchedulerConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration document is malformed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read scheduler config: {err}"),
            Self::Parse(msg) => write!(f, "invalid scheduler config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
