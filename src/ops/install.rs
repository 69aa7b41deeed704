// src/ops/install.rs

//! Install pipeline: apply a package archive to the install root

use super::{lock_pipeline, require_elevated};
use crate::archive::{self, MANIFEST_FILE_NAME, PAYLOAD_FILE_NAME};
use crate::config::Config;
use crate::definition::PackageDefinition;
use crate::error::{Error, Result};
use crate::index::PackageIndex;
use crate::sandbox::{self, Sandbox};
use crate::script::ScriptRunner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings for one install
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub sandbox: Sandbox,
    /// Directory the payload is extracted into
    pub root_dir: PathBuf,
    /// Record the package in the index
    pub register: bool,
    pub require_root: bool,
    pub require_complete_definition: bool,
    pub shell: String,
    pub verbose: bool,
}

impl InstallOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            sandbox: config.sandbox()?,
            root_dir: config.root_dir.clone(),
            register: true,
            require_root: config.require_root,
            require_complete_definition: config.require_complete_definition,
            shell: config.shell.clone(),
            verbose: false,
        })
    }
}

/// Install the package archive at `archive_path`
///
/// All policy checks (privilege, duplicate, completeness) happen before the
/// index or the install root is touched.
pub fn install(
    archive_path: &Path,
    index: &dyn PackageIndex,
    options: &InstallOptions,
) -> Result<PackageDefinition> {
    let _guard = lock_pipeline();
    require_elevated(options.require_root)?;

    let archive_path = sandbox::absolute(archive_path)?;
    let root_dir = sandbox::absolute(&options.root_dir)?;
    let sandbox = Sandbox::new(
        options.sandbox.build_dir(),
        options.sandbox.fake_root_dir(),
        options.sandbox.temp_dir(),
    )?;
    let runner = ScriptRunner::new(&options.shell, options.verbose).with_env(sandbox.script_env());
    info!("Installing {} into {}", archive_path.display(), root_dir.display());

    sandbox.prepare()?;
    archive::unpack(&archive_path, sandbox.temp_dir())?;

    let manifest_path = sandbox.temp_dir().join(MANIFEST_FILE_NAME);
    let definition = PackageDefinition::from_file(&manifest_path)?;
    info!("Package {} {}", definition.name, definition.version);

    if index.contains(&definition.name)? {
        return Err(Error::AlreadyInstalled(definition.name));
    }

    if options.require_complete_definition {
        definition.validate_complete()?;
    } else {
        definition.validate_files()?;
    }

    if options.register {
        index.insert(&definition)?;
    } else {
        warn!("Index registration disabled; {} will not be tracked", definition.name);
    }

    if !definition.before_install_logic.is_empty() {
        runner.run(sandbox.temp_dir(), &definition.before_install_logic, "before install")?;
    }

    fs::create_dir_all(&root_dir).map_err(|e| {
        Error::IoError(format!("Failed to create install root {}: {}", root_dir.display(), e))
    })?;
    let payload = sandbox.temp_dir().join(PAYLOAD_FILE_NAME);
    let extracted = archive::unpack(&payload, &root_dir)?;

    if !definition.after_install_logic.is_empty() {
        runner.run(sandbox.temp_dir(), &definition.after_install_logic, "after install")?;
    }

    sandbox.teardown()?;

    info!(
        "Installed {} {} ({} entries)",
        definition.name,
        definition.version,
        extracted.len()
    );
    Ok(definition)
}
