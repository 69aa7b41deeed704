// src/sandbox.rs

//! Build sandbox directories
//!
//! Every pipeline works inside three scratch directories: the build directory
//! (sources and compilation), the fake root (where the build script "installs"
//! the package) and a temp directory (archive staging, install scripts). They
//! are wiped before use and removed after a successful run.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default build directory
pub const DEFAULT_BUILD_DIR: &str = "/tmp/gumshield/build";

/// Default fake root directory
pub const DEFAULT_FAKE_ROOT_DIR: &str = "/tmp/gumshield/fake_root";

/// Default temp directory
pub const DEFAULT_TEMP_DIR: &str = "/tmp/gumshield/temp";

/// Environment variable naming the build directory for scripts
pub const BUILD_DIR_ENV_VAR: &str = "GUMSHIELD_BUILD_DIR";

/// Environment variable naming the fake root directory for scripts
pub const FAKE_ROOT_DIR_ENV_VAR: &str = "GUMSHIELD_FAKE_ROOT_DIR";

/// The three working directories of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    build_dir: PathBuf,
    fake_root_dir: PathBuf,
    temp_dir: PathBuf,
}

impl Sandbox {
    /// Create a sandbox, resolving all paths to absolute ones
    pub fn new(build_dir: &Path, fake_root_dir: &Path, temp_dir: &Path) -> Result<Self> {
        Ok(Self {
            build_dir: absolute(build_dir)?,
            fake_root_dir: absolute(fake_root_dir)?,
            temp_dir: absolute(temp_dir)?,
        })
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn fake_root_dir(&self) -> &Path {
        &self.fake_root_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn dirs(&self) -> [&Path; 3] {
        [
            self.build_dir.as_path(),
            self.fake_root_dir.as_path(),
            self.temp_dir.as_path(),
        ]
    }

    /// Wipe all three directories and recreate them empty
    pub fn prepare(&self) -> Result<()> {
        self.teardown()?;
        for dir in self.dirs() {
            fs::create_dir_all(dir).map_err(|e| {
                Error::IoError(format!("Failed to create directory {}: {}", dir.display(), e))
            })?;
        }
        debug!("Prepared sandbox in {}", self.temp_dir.display());
        Ok(())
    }

    /// Remove all three directories; missing ones are fine
    pub fn teardown(&self) -> Result<()> {
        for dir in self.dirs() {
            remove_tree(dir)?;
        }
        Ok(())
    }

    /// Variables handed to lifecycle scripts
    pub fn script_env(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            (BUILD_DIR_ENV_VAR, self.build_dir.clone()),
            (FAKE_ROOT_DIR_ENV_VAR, self.fake_root_dir.clone()),
        ]
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            fake_root_dir: PathBuf::from(DEFAULT_FAKE_ROOT_DIR),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
        }
    }
}

/// Resolve `path` against the current directory without touching the filesystem
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| Error::IoError(format!("Failed to resolve {}: {}", path.display(), e)))
}

fn remove_tree(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::IoError(format!(
            "Failed to remove directory {}: {}",
            dir.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox_in(root: &TempDir) -> Sandbox {
        Sandbox::new(
            &root.path().join("build"),
            &root.path().join("fake_root"),
            &root.path().join("temp"),
        )
        .unwrap()
    }

    fn is_empty_dir(path: &Path) -> bool {
        path.is_dir() && fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn test_prepare_wipes_existing_content() {
        let root = TempDir::new().unwrap();
        let sandbox = sandbox_in(&root);

        fs::create_dir_all(sandbox.build_dir().join("old/nested")).unwrap();
        fs::create_dir_all(sandbox.fake_root_dir()).unwrap();
        fs::write(sandbox.fake_root_dir().join("leftover"), b"x").unwrap();

        sandbox.prepare().unwrap();
        for dir in sandbox.dirs() {
            assert!(is_empty_dir(dir));
        }
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let root = TempDir::new().unwrap();
        let sandbox = sandbox_in(&root);

        sandbox.prepare().unwrap();
        sandbox.prepare().unwrap();
        for dir in sandbox.dirs() {
            assert!(is_empty_dir(dir));
        }
    }

    #[test]
    fn test_teardown_tolerates_missing_dirs() {
        let root = TempDir::new().unwrap();
        let sandbox = sandbox_in(&root);

        sandbox.teardown().unwrap();
        sandbox.prepare().unwrap();
        sandbox.teardown().unwrap();
        for dir in sandbox.dirs() {
            assert!(!dir.exists());
        }
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let sandbox = Sandbox::new(
            Path::new("build"),
            Path::new("fake_root"),
            Path::new("temp"),
        )
        .unwrap();
        assert!(sandbox.build_dir().is_absolute());

        let env = sandbox.script_env();
        assert_eq!(env[0].0, BUILD_DIR_ENV_VAR);
        assert_eq!(env[1].1.as_path(), sandbox.fake_root_dir());
    }
}
