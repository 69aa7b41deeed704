// src/ops/uninstall.rs

//! Uninstall pipeline: remove an installed package's files and index entry

use super::{lock_pipeline, require_elevated};
use crate::config::Config;
use crate::definition::PackageDefinition;
use crate::error::{Error, Result};
use crate::index::PackageIndex;
use crate::sandbox::{self, Sandbox};
use crate::script::ScriptRunner;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings for one uninstall
#[derive(Debug, Clone)]
pub struct UninstallOptions {
    pub sandbox: Sandbox,
    /// Directory the package was installed into
    pub root_dir: PathBuf,
    pub require_root: bool,
    pub require_complete_definition: bool,
    pub shell: String,
    pub verbose: bool,
}

impl UninstallOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            sandbox: config.sandbox()?,
            root_dir: config.root_dir.clone(),
            require_root: config.require_root,
            require_complete_definition: config.require_complete_definition,
            shell: config.shell.clone(),
            verbose: false,
        })
    }
}

/// Uninstall the package called `name`
///
/// Only paths listed in the package's file list are touched. Returns the
/// definition that was removed from the index.
pub fn uninstall(
    name: &str,
    index: &dyn PackageIndex,
    options: &UninstallOptions,
) -> Result<PackageDefinition> {
    let _guard = lock_pipeline();
    require_elevated(options.require_root)?;

    let definition = index.require(name)?;
    if options.require_complete_definition {
        definition.validate_complete()?;
    } else {
        definition.validate_files()?;
    }

    let root_dir = sandbox::absolute(&options.root_dir)?;
    let sandbox = Sandbox::new(
        options.sandbox.build_dir(),
        options.sandbox.fake_root_dir(),
        options.sandbox.temp_dir(),
    )?;
    info!("Uninstalling {} {} from {}", definition.name, definition.version, root_dir.display());

    if !definition.uninstall_logic.is_empty() {
        fs::create_dir_all(sandbox.temp_dir()).map_err(|e| {
            Error::IoError(format!(
                "Failed to create directory {}: {}",
                sandbox.temp_dir().display(),
                e
            ))
        })?;
        ScriptRunner::new(&options.shell, options.verbose)
            .with_env(sandbox.script_env())
            .run(sandbox.temp_dir(), &definition.uninstall_logic, "uninstall")?;
    }

    let removed = remove_package_files(&root_dir, &definition.files)?;
    let pruned = remove_empty_package_dirs(&root_dir, &definition.files)?;
    index.remove(&definition.name)?;

    sandbox.teardown()?;

    info!(
        "Uninstalled {} {} ({} files, {} directories removed)",
        definition.name, definition.version, removed, pruned
    );
    Ok(definition)
}

/// Remove every listed path that resolves to a regular file
///
/// Symlinks are followed, so a listed directory that the target system
/// provides as a link (`lib -> usr/lib`) is left alone and the files below
/// it are still found.
fn remove_package_files(root_dir: &Path, files: &[String]) -> Result<usize> {
    let mut removed = 0;
    for file in files {
        let path = root_dir.join(file);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Already gone: {}", path.display());
                continue;
            }
            Err(e) => {
                return Err(Error::IoError(format!(
                    "Failed to inspect {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        if !metadata.is_file() {
            continue;
        }

        fs::remove_file(&path).map_err(|e| {
            Error::IoError(format!("Failed to remove {}: {}", path.display(), e))
        })?;
        removed += 1;
    }
    Ok(removed)
}

/// Remove listed directories that are empty once the files are gone
///
/// Entries are visited last to first, so a listed directory whose listed
/// children were just removed is pruned as well. Directories that are not
/// listed are never touched, and neither are symlinks to directories.
fn remove_empty_package_dirs(root_dir: &Path, files: &[String]) -> Result<usize> {
    let mut pruned = 0;
    for file in files.iter().rev() {
        let path = root_dir.join(file);
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(Error::IoError(format!(
                    "Failed to inspect {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        if !metadata.is_dir() {
            continue;
        }

        let empty = fs::read_dir(&path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?
            .next()
            .is_none();
        if empty {
            fs::remove_dir(&path).map_err(|e| {
                Error::IoError(format!("Failed to remove directory {}: {}", path.display(), e))
            })?;
            pruned += 1;
        }
    }
    Ok(pruned)
}
