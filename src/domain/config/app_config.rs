//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::listening::LanguageTag;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub language: Option<String>,
    pub partial_results: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            language: Some(LanguageTag::default_language().to_string()),
            partial_results: Some(true),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            language: other.language.or(self.language),
            partial_results: other.partial_results.or(self.partial_results),
        }
    }

    /// Get language as a parsed LanguageTag, or the default if not set/invalid
    pub fn language_or_default(&self) -> LanguageTag {
        self.language
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get the partial-results setting, or true if not set
    pub fn partial_results_or_default(&self) -> bool {
        self.partial_results.unwrap_or(true)
    }
}
