// src/config.rs

//! Runtime configuration
//!
//! All settings have built-in defaults. A TOML file can override any subset
//! of them, and command-line flags override the file.
//!
//! ```toml
//! build_dir = "/var/tmp/gumshield/build"
//! index_dir = "/var/lib/gumshield"
//! index_backend = "sqlite"
//! require_complete_definition = true
//! ```

use crate::error::{Error, Result};
use crate::index::DEFAULT_INDEX_DIR;
use crate::sandbox::{DEFAULT_BUILD_DIR, DEFAULT_FAKE_ROOT_DIR, DEFAULT_TEMP_DIR, Sandbox};
use crate::script::DEFAULT_SHELL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file read when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "/etc/gumshield.toml";

/// Default install root
pub const DEFAULT_ROOT_DIR: &str = "/";

/// Storage used for the installed-package index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// One manifest file per package
    #[default]
    Directory,
    /// Manifests in a SQLite database inside the index directory
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub build_dir: PathBuf,
    pub fake_root_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub index_dir: PathBuf,
    pub root_dir: PathBuf,
    /// Interpreter that lifecycle scripts are piped into
    pub shell: String,
    pub index_backend: IndexBackend,
    /// Refuse to install packages that do not declare every lifecycle hook
    pub require_complete_definition: bool,
    /// Refuse to install or uninstall unless running as root
    pub require_root: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            fake_root_dir: PathBuf::from(DEFAULT_FAKE_ROOT_DIR),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            shell: DEFAULT_SHELL.to_string(),
            index_backend: IndexBackend::Directory,
            require_complete_definition: true,
            require_root: true,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Sandbox built from the configured directories
    pub fn sandbox(&self) -> Result<Sandbox> {
        Sandbox::new(&self.build_dir, &self.fake_root_dir, &self.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.build_dir, PathBuf::from("/tmp/gumshield/build"));
        assert_eq!(config.index_dir, PathBuf::from("/var/lib/gumshield"));
        assert_eq!(config.index_backend, IndexBackend::Directory);
        assert!(config.require_complete_definition);
        assert!(config.require_root);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("index_backend = \"sqlite\"\nroot_dir = \"/mnt/target\"\n").unwrap();
        assert_eq!(config.index_backend, IndexBackend::Sqlite);
        assert_eq!(config.root_dir, PathBuf::from("/mnt/target"));
        assert_eq!(config.shell, "bash");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            Config::parse("no_such_key = 1\n"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.require_root = false;
        let text = config.to_toml().unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_load_explicit_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "temp_dir = \"/var/tmp/gs\"\n").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.temp_dir, PathBuf::from("/var/tmp/gs"));
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/gumshield.toml"))).is_err());
    }
}
