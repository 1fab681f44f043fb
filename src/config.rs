//! Run configuration
//!
//! [`HarvestConfig::default`] carries the deployment constants of the directory.
//! A JSON file may override any subset of them; missing keys keep their defaults.

use crate::error::HarvestError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Page embedding the directory search
pub const HOST_URL: &str = "https://tahoemls.com/general/?https://members.tahoemls.com/public/members_search.cfm";

/// Search form served inside the host page's iframe
pub const SEARCH_URL: &str = "https://members.tahoemls.com/public/members_search.cfm";

/// Base that relative profile links are resolved against
pub const BASE_URL: &str = "https://members.tahoemls.com/public/";

pub const CONCURRENCY_LIMIT: usize = 10;
pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(5);
pub const OUTPUT_FILE: &str = "results.csv";

/// Per-operation timeouts, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Loading a profile page (the legacy server is slow)
    pub profile_navigation_ms: u64,

    /// Loading the host page during bootstrap
    pub host_navigation_ms: u64,

    /// Waiting for an element (iframe, search form, result rows)
    pub element_wait_ms: u64,

    /// Waiting for a frame to reach content-loaded
    pub frame_load_ms: u64,

    /// Pause after clicking "Next" so the re-render is not raced
    pub page_settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            profile_navigation_ms: 90_000,
            host_navigation_ms: 30_000,
            element_wait_ms: 15_000,
            frame_load_ms: 15_000,
            page_settle_ms: 1_000,
        }
    }
}

impl Timeouts {
    pub fn profile_navigation(&self) -> Duration {
        Duration::from_millis(self.profile_navigation_ms)
    }

    pub fn host_navigation(&self) -> Duration {
        Duration::from_millis(self.host_navigation_ms)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    pub fn frame_load(&self) -> Duration {
        Duration::from_millis(self.frame_load_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}

/// Everything a harvest run needs besides the browser itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub host_url: String,
    pub search_url: String,
    pub base_url: String,

    /// Maximum profile scrapes in flight
    pub concurrency: usize,

    /// Attempts per profile, including the first
    pub max_attempts: u32,

    /// Fixed pause between attempts
    pub retry_delay_ms: u64,

    pub timeouts: Timeouts,

    /// CSV destination
    pub output: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            host_url: HOST_URL.to_string(),
            search_url: SEARCH_URL.to_string(),
            base_url: BASE_URL.to_string(),
            concurrency: CONCURRENCY_LIMIT,
            max_attempts: MAX_ATTEMPTS,
            retry_delay_ms: RETRY_DELAY.as_millis() as u64,
            timeouts: Timeouts::default(),
            output: PathBuf::from(OUTPUT_FILE),
        }
    }
}

impl HarvestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a JSON file on top of the defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set the concurrency ceiling
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Builder method: set attempts per profile
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Builder method: set the pause between attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Builder method: set the CSV destination
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Builder method: replace all timeouts
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn retry_delay_duration(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// The parsed base address for resolving profile links
    pub fn base(&self) -> Result<Url, HarvestError> {
        Url::parse(&self.base_url).map_err(|e| HarvestError::InvalidConfig(format!("base_url '{}': {}", self.base_url, e)))
    }

    /// Reject settings a run cannot make progress with
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.concurrency == 0 {
            return Err(HarvestError::InvalidConfig("concurrency must be at least 1".to_string()));
        }

        if self.max_attempts == 0 {
            return Err(HarvestError::InvalidConfig("max_attempts must be at least 1".to_string()));
        }

        for (name, value) in [("host_url", &self.host_url), ("search_url", &self.search_url)] {
            Url::parse(value).map_err(|e| HarvestError::InvalidConfig(format!("{} '{}': {}", name, value, e)))?;
        }
        self.base()?;

        Ok(())
    }
}
