//! Configuration module
//!
//! Connection and pacing settings shared by all commands.

use std::time::Duration;
use thiserror::Error;

use crate::output::OutputFormat;
use crate::scheduler::poller::DEFAULT_POLL_INTERVAL;

/// Region used when none is given
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("region cannot be empty")]
    EmptyRegion,

    #[error("profile name cannot be empty")]
    EmptyProfile,

    #[error("poll_interval must be greater than 0")]
    ZeroPollInterval,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS region queries run in
    pub region: String,

    /// Named AWS profile; the default credential chain is used when unset
    pub profile: Option<String>,

    /// Pause between two status probes
    pub poll_interval: Duration,

    /// How result rows are printed
    pub output: OutputFormat,
}

impl Config {
    /// Creates a configuration with defaults for the given region
    pub fn new(region: String) -> Self {
        Self {
            region,
            profile: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            output: OutputFormat::Text,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }

        if self.profile.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::EmptyProfile);
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_REGION.to_string())
    }
}
