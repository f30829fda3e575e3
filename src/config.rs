use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::database::DEFAULT_POLL_INTERVAL;
use crate::names::DisplayNames;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ViewerConfig {
    pub database: Option<String>,
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub display_names: DisplayNames,
}

impl ViewerConfig {
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
            .max(Duration::from_millis(1))
    }

    /// Explicit path wins over the configured one
    pub fn database_path(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
    }

    /// Starter config written by `init`
    pub fn template() -> Self {
        let mut display_names = DisplayNames::new();
        display_names.insert("4915112345678@s.whatsapp.net", "Example Contact");
        Self {
            database: Some("msgstore.db".to_string()),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL.as_millis() as u64),
            display_names,
        }
    }

    /// Read a config file. A missing file is `Ok(None)`, not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let config = toml::from_str(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    /// Write this config as TOML. Refuses to replace an existing file unless `force`.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(Error::ConfigExists(path.to_path_buf()));
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Wrote config to {}", path.display());
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("msgview.toml")
}
