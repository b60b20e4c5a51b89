//! Configuration for log capture and investigations

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiagnosticsError, Result};

/// Logger the query engine reports per-index costs on
pub const QUERY_PLANNING_LOGGER: &str = "org.apache.jackrabbit.oak.query.QueryImpl";

/// Maximum captured lines kept per correlation key
pub const DEFAULT_CAPTURE_CAPACITY: usize = 500;

/// Rows consumed in the first-page timing phase
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Log capture configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Maximum entries stored per correlation key; later entries are dropped
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Only events from this logger are captured
    #[serde(default = "default_target_logger")]
    pub target_logger: String,
}

fn default_capacity() -> usize { DEFAULT_CAPTURE_CAPACITY }
fn default_target_logger() -> String { QUERY_PLANNING_LOGGER.to_string() }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPTURE_CAPACITY,
            target_logger: QUERY_PLANNING_LOGGER.to_string(),
        }
    }
}

impl CaptureConfig {
    /// Set the per-key capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the captured logger name
    pub fn with_target_logger(mut self, target_logger: &str) -> Self {
        self.target_logger = target_logger.to_string();
        self
    }
}

/// Investigator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigatorConfig {
    /// Rows read during the first-page phase
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Capture settings used when the investigator owns its interceptor
    #[serde(default)]
    pub capture: CaptureConfig,
}

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

impl Default for InvestigatorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            capture: CaptureConfig::default(),
        }
    }
}

impl InvestigatorConfig {
    /// Set the first-page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set capture settings
    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DiagnosticsError::FixtureLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
