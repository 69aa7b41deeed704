// src/ops/build.rs

//! Build pipeline: turn a package definition into a package archive

use super::lock_pipeline;
use crate::archive;
use crate::config::Config;
use crate::definition::PackageDefinition;
use crate::error::Result;
use crate::fetch::{self, Downloader};
use crate::sandbox::{self, Sandbox};
use crate::script::ScriptRunner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Settings for one build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub sandbox: Sandbox,
    /// Where the package archive is written
    pub output: PathBuf,
    /// Directory searched for sources before downloading them
    pub sources_dir: Option<PathBuf>,
    pub shell: String,
    /// Pass script output through to this process
    pub verbose: bool,
}

impl BuildOptions {
    pub fn from_config(config: &Config, output: &Path) -> Result<Self> {
        Ok(Self {
            sandbox: config.sandbox()?,
            output: output.to_path_buf(),
            sources_dir: None,
            shell: config.shell.clone(),
            verbose: false,
        })
    }
}

/// Build `definition` into a package archive at `options.output`
///
/// Returns the definition as embedded in the archive, with `files` filled
/// in from the fake root.
pub fn build(
    mut definition: PackageDefinition,
    options: &BuildOptions,
    downloader: &dyn Downloader,
) -> Result<PackageDefinition> {
    let _guard = lock_pipeline();
    info!("Building {} {}", definition.name, definition.version);

    let sandbox = Sandbox::new(
        options.sandbox.build_dir(),
        options.sandbox.fake_root_dir(),
        options.sandbox.temp_dir(),
    )?;
    let output = sandbox::absolute(&options.output)?;
    let runner = ScriptRunner::new(&options.shell, options.verbose).with_env(sandbox.script_env());

    sandbox.prepare()?;

    if let Some(sources_dir) = &options.sources_dir {
        let staged = fetch::stage_local_sources(&definition.sources, sources_dir, sandbox.build_dir())?;
        info!("Using {} local source(s) from {}", staged, sources_dir.display());
    }
    fetch::fetch_sources(downloader, &definition.sources, sandbox.build_dir())?;

    runner.run(sandbox.build_dir(), &definition.build_logic, "build")?;

    archive::pack(
        sandbox.fake_root_dir(),
        sandbox.temp_dir(),
        &output,
        &mut definition,
    )?;

    sandbox.teardown()?;

    info!(
        "Built {} {} ({} files) into {}",
        definition.name,
        definition.version,
        definition.files.len(),
        output.display()
    );
    Ok(definition)
}
