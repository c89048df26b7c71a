use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokenpoll::ApiFlavor;

use crate::error::{CliError, Result};

/// Persistent CLI defaults, merged under command-line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the token service.
    pub server: Option<String>,
    /// Default location to watch.
    pub location: Option<String>,
    /// Wire flavor: "tokens" or "legacy".
    pub flavor: Option<String>,
    /// File the QR PNG is written to.
    pub output: Option<PathBuf>,
    /// Retry countdown length in seconds.
    pub countdown: Option<u32>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("qrgate").join("config.toml"))
            .ok_or_else(|| CliError::config("no configuration directory available"))
    }

    fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Load the configuration file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| CliError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents)
            .map_err(|e| CliError::config(format!("cannot parse `{}`: {e}", path.display())))
    }

    /// Overwrite the configuration file with defaults.
    pub fn reset(path: Option<&Path>) -> Result<()> {
        let path = Self::resolve_path(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, Self::default().show()?)?;
        Ok(())
    }

    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("cannot serialize configuration: {e}")))
    }

    /// Parse the configured wire flavor, if any.
    pub fn flavor(&self) -> Result<Option<ApiFlavor>> {
        match self.flavor.as_deref() {
            None => Ok(None),
            Some("tokens") => Ok(Some(ApiFlavor::Tokens)),
            Some("legacy") => Ok(Some(ApiFlavor::Legacy)),
            Some(other) => Err(CliError::config(format!(
                "unknown flavor `{other}`, expected \"tokens\" or \"legacy\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(config.server.is_none());
        assert!(config.flavor().unwrap().is_none());
    }

    #[test]
    fn reset_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        AppConfig::reset(Some(&path)).unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(config.server.is_none());
    }

    #[test]
    fn parses_populated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "server = \"https://example.com\"\nflavor = \"legacy\"\ncountdown = 5\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.as_deref(), Some("https://example.com"));
        assert_eq!(config.flavor().unwrap(), Some(ApiFlavor::Legacy));
        assert_eq!(config.countdown, Some(5));
    }

    #[test]
    fn rejects_unknown_flavor() {
        let config = AppConfig {
            flavor: Some("modern".to_string()),
            ..AppConfig::default()
        };
        assert!(config.flavor().is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "serverr = \"typo\"\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
