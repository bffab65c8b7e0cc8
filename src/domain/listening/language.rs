//! Recognition language value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::LanguageParseError;

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Value object for a recognition language/locale tag (BCP-47 style).
/// Immutable and validated on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Default recognition language (`en-US`)
    pub fn default_language() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }

    /// Get the tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageTag {
    type Err = LanguageParseError;

    /// Parse and normalize a language tag.
    /// Accepted shape: an alphabetic primary subtag (2-8 letters) optionally
    /// followed by `-` separated alphanumeric subtags of 1-8 characters.
    /// Normalization: primary subtag lowercased, two-letter region subtags
    /// uppercased (`EN-us` parses to `en-US`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(LanguageParseError {
                input: s.to_string(),
            });
        }

        let mut normalized = Vec::new();
        for (index, subtag) in input.split('-').enumerate() {
            let valid_len = (1..=8).contains(&subtag.len());
            let valid_chars = subtag.chars().all(|c| c.is_ascii_alphanumeric());
            if !valid_len || !valid_chars {
                return Err(LanguageParseError {
                    input: s.to_string(),
                });
            }
            if index == 0 {
                if subtag.len() < 2 || !subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(LanguageParseError {
                        input: s.to_string(),
                    });
                }
                normalized.push(subtag.to_ascii_lowercase());
            } else if subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                normalized.push(subtag.to_ascii_uppercase());
            } else {
                normalized.push(subtag.to_string());
            }
        }

        Ok(Self(normalized.join("-")))
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::default_language()
    }
}
