//! Monitor configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collection monitored when the operator accepts the default.
pub const DEFAULT_COLLECTION: &str = "all";

/// Keyword offered when the operator accepts the default.
pub const DEFAULT_KEYWORD: &str = "kangaroo";

/// Errors from validating a monitor configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Collection name was empty.
    #[error("collection name must not be empty")]
    EmptyCollection,

    /// Collection name contained characters the platform does not allow.
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    /// Keyword was empty; it would match every item.
    #[error("keyword must not be empty")]
    EmptyKeyword,
}

/// What to monitor: one collection and one keyword.
///
/// Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    collection: String,
    keyword: String,
}

impl MonitorConfig {
    /// Creates a validated configuration.
    ///
    /// The collection name is trimmed and a leading `r/` or `/r/` is removed.
    /// The keyword is kept verbatim (matching is case-sensitive).
    pub fn new(collection: &str, keyword: &str) -> Result<Self, ConfigError> {
        let collection = collection.trim();
        let collection = collection
            .strip_prefix("/r/")
            .or_else(|| collection.strip_prefix("r/"))
            .unwrap_or(collection);

        if collection.is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        // Multireddit syntax (`a+b`) is allowed by the platform.
        if !collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
        {
            return Err(ConfigError::InvalidCollection(collection.to_string()));
        }
        if keyword.is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }

        Ok(Self {
            collection: collection.to_string(),
            keyword: keyword.to_string(),
        })
    }

    /// Returns the monitored collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}
