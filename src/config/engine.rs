//! Process-level engine configuration
//!
//! Built once at startup and handed to the instance factory. Every field has a
//! default, so a partial `arena-engine.toml` is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::files::TEMPLATES_DIR;
use crate::constants::terrain::DEFAULT_MAX_HEIGHT;
use crate::error::{config_error, ArenaErrorContext, ArenaResult};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one folder per arena template
    pub templates_dir: PathBuf,
    /// Directory the host loads environments from; working copies go here
    pub container_dir: PathBuf,
    /// Build height of hosted environments
    pub max_height: usize,
    /// Per-height data values painted onto generated chunks
    pub overlay: Option<Vec<u8>>,
    /// Randomise spawn order when an arena is loaded
    pub shuffle_spawns: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(TEMPLATES_DIR),
            container_dir: PathBuf::from("."),
            max_height: DEFAULT_MAX_HEIGHT,
            overlay: None,
            shuffle_spawns: true,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).io_context(path)?;
        let config: EngineConfig = toml::from_str(&raw).map_err(|err| config_error(path, err))?;
        config.validate().map_err(|message| config_error(path, message))?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults if it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Config rooted at `root`, templates in `root/worlds`, containers in `root/containers`
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            templates_dir: root.join(TEMPLATES_DIR),
            container_dir: root.join("containers"),
            ..Self::default()
        }
    }

    /// Check the settings are usable, returning a description of the first problem
    pub fn validate(&self) -> Result<(), String> {
        if self.max_height == 0 || self.max_height % 16 != 0 {
            return Err(format!(
                "max_height must be a positive multiple of 16, got {}",
                self.max_height
            ));
        }
        // Working copies must never land where the catalog scans for templates
        if self.container_dir.starts_with(&self.templates_dir) {
            return Err(format!(
                "container_dir ({}) must not be inside templates_dir ({})",
                self.container_dir.display(),
                self.templates_dir.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let path = temp_dir.path().join("arena-engine.toml");
        fs::write(&path, "templates_dir = \"maps\"\noverlay = [0, 0, 4]\n").expect("Failed to write config");

        let config = EngineConfig::load(&path).expect("Failed to load config");
        assert_eq!(config.templates_dir, PathBuf::from("maps"));
        assert_eq!(config.max_height, 256);
        assert_eq!(config.overlay, Some(vec![0, 0, 4]));
        assert!(config.shuffle_spawns);
    }

    #[test]
    fn test_invalid_height_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let path = temp_dir.path().join("arena-engine.toml");
        fs::write(&path, "max_height = 100\n").expect("Failed to write config");

        assert!(matches!(
            EngineConfig::load(&path),
            Err(crate::error::ArenaError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_file_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let config = EngineConfig::load_or_default(temp_dir.path().join("absent.toml"))
            .expect("Failed to fall back to defaults");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_container_inside_templates_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut config = EngineConfig::rooted_at(temp_dir.path());
        assert!(config.validate().is_ok());

        config.container_dir = config.templates_dir.clone();
        assert!(config.validate().is_err());

        config.container_dir = config.templates_dir.join("live");
        assert!(config.validate().is_err());

        let path = temp_dir.path().join("arena-engine.toml");
        fs::write(&path, "templates_dir = \"maps\"\ncontainer_dir = \"maps\"\n").expect("Failed to write config");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(crate::error::ArenaError::Config { .. })
        ));
    }
}
