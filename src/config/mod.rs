#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "http://localhost:9200";

/// Upper bound sent as `size` by `find_all`. Stands in for pagination.
pub const DEFAULT_FIND_ALL_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub url: String,
    pub timeout_seconds: Option<u64>,
    pub find_all_size: usize,
    pub refresh_on_write: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_seconds: None,
            find_all_size: DEFAULT_FIND_ALL_SIZE,
            refresh_on_write: false,
        }
    }
}

impl AdapterConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn from_provider<C: ConfigProvider + ?Sized>(provider: &C) -> Self {
        Self {
            url: provider.base_url().to_string(),
            timeout_seconds: provider.timeout_seconds(),
            find_all_size: provider.find_all_size(),
            refresh_on_write: provider.refresh_on_write(),
        }
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn with_find_all_size(mut self, size: usize) -> Self {
        self.find_all_size = size;
        self
    }

    pub fn with_refresh_on_write(mut self, refresh: bool) -> Self {
        self.refresh_on_write = refresh;
        self
    }
}

impl ConfigProvider for AdapterConfig {
    fn base_url(&self) -> &str {
        &self.url
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn find_all_size(&self) -> usize {
        self.find_all_size
    }

    fn refresh_on_write(&self) -> bool {
        self.refresh_on_write
    }
}

impl Validate for AdapterConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("url", &self.url)?;
        validation::validate_positive_number("find_all_size", self.find_all_size, 1)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("timeout_seconds", timeout as usize, 1)?;
        }
        Ok(())
    }
}
