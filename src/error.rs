//! Error types. Configuration errors are fail-fast and reported before the
//! event loop starts (spec.md §7); there is deliberately no retry/backoff
//! machinery anywhere in this crate.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    /// A sample file could not be opened.
    MissingSampleFile { path: PathBuf, source: std::io::Error },
    /// A sample file was readable but produced zero usable samples.
    EmptyDistribution { path: PathBuf },
    /// `depth` was less than the required minimum of 1.
    InvalidDepth { depth: u32 },
    /// Configuration TOML overlay could not be parsed.
    InvalidConfigFile { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSampleFile { path, source } => {
                write!(f, "cannot read sample file {}: {}", path.display(), source)
            }
            ConfigError::EmptyDistribution { path } => {
                write!(f, "sample file {} yielded no usable samples", path.display())
            }
            ConfigError::InvalidDepth { depth } => {
                write!(f, "depth must be >= 1, got {depth}")
            }
            ConfigError::InvalidConfigFile { path, source } => {
                write!(f, "invalid config file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
