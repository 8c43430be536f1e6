use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// What to do when a listed child frame cannot be entered in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnenterablePolicy {
    /// Stop the whole search and report not-found
    #[default]
    AbortSearch,
    /// Skip that frame's subtree and continue with its next sibling
    SkipFrame,
}

/// Tuning for one frame search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Overall bound on entering one child frame
    pub frame_timeout_ms: u64,
    /// Retry period while a child frame is not yet attached
    pub poll_interval_ms: u64,
    /// Bound on one liveness check of a located element
    pub check_timeout_ms: u64,
    pub on_unenterable: UnenterablePolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            frame_timeout_ms: 300,
            poll_interval_ms: 100,
            check_timeout_ms: 500,
            on_unenterable: UnenterablePolicy::AbortSearch,
        }
    }
}

impl SearchConfig {
    /// Create a configuration with default timeouts
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Reading search configuration from: {}", path.display());

        let file = File::open(path)?;
        let config: SearchConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_policy(mut self, policy: UnenterablePolicy) -> Self {
        self.on_unenterable = policy;
        self
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    /// Reject values that would make frame entry or checks meaningless
    pub fn validate(&self) -> Result<()> {
        if self.frame_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "frame_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms > self.frame_timeout_ms {
            return Err(Error::InvalidConfig(format!(
                "poll_interval_ms ({}) exceeds frame_timeout_ms ({})",
                self.poll_interval_ms, self.frame_timeout_ms
            )));
        }
        if self.check_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "check_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
