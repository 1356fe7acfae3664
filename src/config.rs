//! Editor configuration
//!
//! One explicit configuration object per editor instance. Every field has a
//! default, so hosts only pass what they want to change. The same shape loads
//! from a JS object, JSON or YAML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decorations::DEFAULT_PLACEHOLDER;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Text shown while the document is empty
    pub placeholder: String,
    /// Quiet period before an edit is saved (ms)
    pub debounce_ms: u64,
    /// Maximum number of undo entries
    pub history_depth: usize,
    /// Typing within this window undoes as one unit (ms)
    pub group_delay_ms: u64,
    /// Base URL of the document API (`/documents` is appended)
    pub api_base_url: String,
    /// How often a failed document list request is retried on network errors
    pub load_retries: u32,
    /// Flush a pending save when switching documents instead of dropping it
    pub flush_on_switch: bool,
    /// Resolve `Mod` to the Meta key
    pub mac_keys: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            debounce_ms: 1000,
            history_depth: 100,
            group_delay_ms: 500,
            api_base_url: "/api/v1".to_string(),
            load_retries: 3,
            flush_on_switch: true,
            mac_keys: false,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid("historyDepth must be at least 1".to_string()));
        }
        Ok(self)
    }

    /// Document collection endpoint
    pub fn documents_url(&self) -> String {
        format!("{}/documents", self.api_base_url.trim_end_matches('/'))
    }
}
