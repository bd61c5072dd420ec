//! Initial stat configuration.
//!
//! A `StatConfig` is the ordered list of `(tag, base_value)` pairs an entity
//! is constructed from. It is supplied once; duplicates are tolerated here
//! and rejected (first wins) when the store is built.

use crate::error::StatError;
use crate::stat_tag::StatTag;
use serde::{Deserialize, Serialize};

/// One configured stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatConfigEntry {
    pub tag: StatTag,
    pub base_value: f64,
}

/// Ordered list of initial stat values for one entity.
///
/// # Examples
///
/// ```rust
/// use zzeffect::{StatConfig, StatTag};
///
/// let config = StatConfig::new()
///     .with(StatTag::Health, 100.0)
///     .with(StatTag::MoveSpeed, 5.0);
///
/// assert_eq!(config.len(), 2);
/// assert_eq!(config.entries()[0].tag, StatTag::Health);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatConfig {
    #[serde(default)]
    entries: Vec<StatConfigEntry>,
}

impl StatConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, builder style.
    pub fn with(mut self, tag: StatTag, base_value: f64) -> Self {
        self.push(tag, base_value);
        self
    }

    /// Append an entry.
    pub fn push(&mut self, tag: StatTag, base_value: f64) {
        self.entries.push(StatConfigEntry { tag, base_value });
    }

    /// Entries in the order they were supplied.
    pub fn entries(&self) -> &[StatConfigEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a configuration from JSON.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zzeffect::{StatConfig, StatTag};
    ///
    /// let json = r#"{ "entries": [
    ///     { "tag": "health", "base_value": 100.0 },
    ///     { "tag": "fire_interval", "base_value": 0.25 }
    /// ] }"#;
    ///
    /// let config = StatConfig::from_json(json).unwrap();
    /// assert_eq!(config.entries()[1].tag, StatTag::FireInterval);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, StatError> {
        serde_json::from_str(json).map_err(|err| StatError::InvalidConfig(err.to_string()))
    }

    /// Serialize this configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StatError> {
        serde_json::to_string_pretty(self).map_err(|err| StatError::InvalidConfig(err.to_string()))
    }
}

impl FromIterator<(StatTag, f64)> for StatConfig {
    fn from_iter<I: IntoIterator<Item = (StatTag, f64)>>(iter: I) -> Self {
        let mut config = StatConfig::new();
        for (tag, base_value) in iter {
            config.push(tag, base_value);
        }
        config
    }
}
