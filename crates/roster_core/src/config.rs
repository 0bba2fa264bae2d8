//! Board configuration.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - `default_interval_minutes` is clamped on use, never rejected.

use crate::model::panel::{clamp_interval, DEFAULT_INTERVAL_MINUTES};
use serde::{Deserialize, Serialize};

/// Storage key prefix shared with existing browser data.
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "scheduleApp";

/// Tunables for one board instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// Prefix prepended to every persisted key.
    pub storage_key_prefix: String,
    /// Board-wide interval used when none was saved.
    pub default_interval_minutes: i64,
    /// Assign palette colors to names.
    pub color_names: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            default_interval_minutes: i64::from(DEFAULT_INTERVAL_MINUTES),
            color_names: true,
        }
    }
}

impl BoardConfig {
    /// Parses a JSON config object. Absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Default interval after clamping into the supported range.
    pub fn default_interval(&self) -> u32 {
        clamp_interval(self.default_interval_minutes).0
    }
}

#[cfg(test)]
mod tests {
    use super::BoardConfig;

    #[test]
    fn empty_object_yields_defaults() {
        let config = BoardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.storage_key_prefix, "scheduleApp");
        assert_eq!(config.default_interval(), 60);
    }

    #[test]
    fn partial_object_overrides_only_named_fields() {
        let config =
            BoardConfig::from_json_str(r#"{"color_names": false, "default_interval_minutes": 5}"#)
                .unwrap();
        assert!(!config.color_names);
        assert_eq!(config.default_interval(), 10);
        assert_eq!(config.storage_key_prefix, "scheduleApp");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(BoardConfig::from_json_str(r#"{"per_panel": true}"#).is_err());
    }
}
