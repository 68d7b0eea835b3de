//! Client settings, read from and written to a RON file with [confy].
//!
//! The default file is `~/.config/cytomine/default-config.ron` on Linux.

use crate::collection::SaveOptions;
use crate::constants::{APP_NAME, DEFAULT_CHUNK_SIZE};
use crate::errors::ConfigError;
use crate::types::ApiUrl;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of a client.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Server to connect to, if not given elsewhere.
    pub host: Option<ApiUrl>,
    pub upload: UploadSettings,
}

/// Defaults of [crate::Collection::save].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct UploadSettings {
    pub chunk: Option<usize>,
    pub n_workers: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            chunk: Some(DEFAULT_CHUNK_SIZE),
            n_workers: 0,
        }
    }
}

impl From<&UploadSettings> for SaveOptions {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            chunk: settings.chunk,
            n_workers: settings.n_workers,
        }
    }
}

impl Settings {
    /// Load settings from the default file, which is created if missing.
    pub fn load_default() -> Result<Self, ConfigError> {
        let settings: Self = confy::load(APP_NAME, None)?;
        log::debug!("loaded settings {:?}", settings);
        Ok(settings)
    }

    /// Load settings from `path`, which is created with the defaults if missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(confy::load_path(path)?)
    }

    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        Ok(confy::store_path(path, self)?)
    }

    pub fn save_options(&self) -> SaveOptions {
        (&self.upload).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_has_defaults() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cytomine.ron");
        let settings = Settings::load(&path)?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.save_options(), SaveOptions::default());
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_store_then_load() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cytomine.ron");
        let settings = Settings {
            host: Some(ApiUrl::try_from("https://research.cytomine.be/api/")?),
            upload: UploadSettings {
                chunk: None,
                n_workers: 4,
            },
        };
        settings.store(&path)?;
        assert_eq!(Settings::load(&path)?, settings);
        assert_eq!(
            settings.save_options(),
            SaveOptions {
                chunk: None,
                n_workers: 4
            }
        );
        Ok(())
    }
}
