// src/index/directory.rs

//! Flat-directory index: one serialized definition per installed package

use super::PackageIndex;
use crate::definition::{self, DEFINITION_FILE_EXTENSION, PackageDefinition};
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Index stored as `<dir>/<name>.elplan` files
#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    dir: PathBuf,
}

impl DirectoryIndex {
    /// Open the index at `dir`, creating the directory if needed
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            Error::IoError(format!("Failed to create index directory {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the manifest for `name`
    pub fn entry_path(&self, name: &str) -> Result<PathBuf> {
        definition::validate_name(name)?;
        Ok(self
            .dir
            .join(format!("{}.{}", name, DEFINITION_FILE_EXTENSION)))
    }
}

impl PackageIndex for DirectoryIndex {
    fn list(&self) -> Result<Vec<PackageDefinition>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::IoError(format!(
                    "Failed to read index directory {}: {}",
                    self.dir.display(),
                    e
                )));
            }
        };

        let mut packages = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_manifest = path
                .extension()
                .is_some_and(|ext| ext == DEFINITION_FILE_EXTENSION);
            if !is_manifest || !path.is_file() {
                warn!("Ignoring unexpected index entry {}", path.display());
                continue;
            }
            packages.push(PackageDefinition::from_file(&path)?);
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    fn get(&self, name: &str) -> Result<Option<PackageDefinition>> {
        let path = self.entry_path(name)?;
        if !path.is_file() {
            return Ok(None);
        }
        PackageDefinition::from_file(&path).map(Some)
    }

    fn insert(&self, definition: &PackageDefinition) -> Result<()> {
        let path = self.entry_path(&definition.name)?;
        if path.exists() {
            return Err(Error::AlreadyInstalled(definition.name.clone()));
        }
        definition.write_to(&path)?;
        debug!("Indexed {} at {}", definition.name, path.display());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.entry_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed index entry {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFoundError(format!(
                "Package '{}' is not installed",
                name
            ))),
            Err(e) => Err(Error::IoError(format!(
                "Failed to remove index entry {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
