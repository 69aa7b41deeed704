// src/index/mod.rs

//! Installed-package index
//!
//! The index is the only record of what is installed: a package is installed
//! exactly when the index holds an entry for its name. Pipelines use it
//! through the [`PackageIndex`] trait. Two stores are provided:
//!
//! - [`DirectoryIndex`]: one `<name>.elplan` manifest per package in a
//!   directory (the default)
//! - [`SqliteIndex`]: the same manifests kept in a SQLite database

pub mod directory;
pub mod schema;
pub mod sqlite;

use crate::config::{Config, IndexBackend};
use crate::definition::PackageDefinition;
use crate::error::{Error, Result};

pub use directory::DirectoryIndex;
pub use sqlite::SqliteIndex;

/// Default index location
pub const DEFAULT_INDEX_DIR: &str = "/var/lib/gumshield";

/// File name of the SQLite database inside the index directory
pub const SQLITE_INDEX_FILE_NAME: &str = "index.db";

/// Keyed store of installed package definitions
pub trait PackageIndex {
    /// All installed packages, ordered by name
    fn list(&self) -> Result<Vec<PackageDefinition>>;

    /// Look up an installed package by name
    fn get(&self, name: &str) -> Result<Option<PackageDefinition>>;

    /// Record a package as installed; fails if the name is already present
    fn insert(&self, definition: &PackageDefinition) -> Result<()>;

    /// Remove a package entry; fails if the name is not present
    fn remove(&self, name: &str) -> Result<()>;

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Like [`PackageIndex::get`], but a missing package is an error
    fn require(&self, name: &str) -> Result<PackageDefinition> {
        self.get(name)?
            .ok_or_else(|| Error::NotFoundError(format!("Package '{}' is not installed", name)))
    }
}

/// Open the index store selected by the configuration
pub fn open(config: &Config) -> Result<Box<dyn PackageIndex>> {
    match config.index_backend {
        IndexBackend::Directory => Ok(Box::new(DirectoryIndex::open(&config.index_dir)?)),
        IndexBackend::Sqlite => {
            std::fs::create_dir_all(&config.index_dir).map_err(|e| {
                Error::IoError(format!(
                    "Failed to create index directory {}: {}",
                    config.index_dir.display(),
                    e
                ))
            })?;
            let db_path = config.index_dir.join(SQLITE_INDEX_FILE_NAME);
            Ok(Box::new(SqliteIndex::open(&db_path)?))
        }
    }
}
