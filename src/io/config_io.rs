use std::fs;
use std::io;
use std::path::Path;

use crate::model::config::StoreConfig;

/// Error type for config I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    ReadError(#[from] io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Read slate.toml from the given path. A missing file yields the
/// defaults; a present-but-broken file is an error the caller should
/// surface rather than silently ignore.
pub fn read_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    if !path.exists() {
        return Ok(StoreConfig::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = read_config(&tmp.path().join("slate.toml")).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn parses_fields_and_keeps_defaults_for_the_rest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slate.toml");
        fs::write(&path, "debounce_ms = 150\ntheme = \"dark\"\n").unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.theme, "dark");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn broken_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slate.toml");
        fs::write(&path, "debounce_ms = [not toml").unwrap();
        assert!(matches!(
            read_config(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
