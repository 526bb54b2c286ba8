use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration from slate.toml. Every field has a default; a missing
/// config file yields `StoreConfig::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory the storage backend writes into. Defaults to the
    /// current directory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Trailing debounce window for ordinary persistence writes.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Theme applied when no persisted snapshot overrides it.
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: None,
            debounce_ms: default_debounce_ms(),
            theme: default_theme(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_theme() -> String {
    "light".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.theme, "light");
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: StoreConfig = toml::from_str("debounce_ms = 50").unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.theme, "light");
        assert!(config.data_dir.is_none());
    }
}
