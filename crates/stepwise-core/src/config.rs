//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuideError, Result};

/// Policy knobs consumed by the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Failures a step may accumulate before any further failure aborts the
    /// session.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

impl EngineConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GuideError::FileSystem {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| GuideError::Configuration {
            message: format!("Invalid config file '{}': {e}", path.display()),
        })
    }

    /// Location of the user's config file, if one exists:
    /// `$XDG_CONFIG_HOME/stepwise/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        xdg::BaseDirectories::with_prefix("stepwise").find_config_file("config.json")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_max_retries() {
        assert_eq!(EngineConfig::default().max_retries, 3);
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        assert_eq!(EngineConfig::load(file.path()).unwrap(), EngineConfig::default());

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_retries": 5}}"#).unwrap();
        assert_eq!(EngineConfig::load(file.path()).unwrap().max_retries, 5);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "max_retries = 5").unwrap();
        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, GuideError::Configuration { .. }));
    }
}
