// src/show.rs

//! Read-only reports over the index and configuration
//!
//! Each report writes plain text to any [`Write`] so the CLI can print to
//! stdout and tests can capture into a buffer.

use crate::config::Config;
use crate::error::Result;
use crate::index::PackageIndex;
use std::io::Write;

/// Names of all installed packages, one per line
pub fn installed(index: &dyn PackageIndex, out: &mut dyn Write) -> Result<()> {
    for package in index.list()? {
        writeln!(out, "{}", package.name)?;
    }
    Ok(())
}

/// Files owned by an installed package, one per line
pub fn files(index: &dyn PackageIndex, name: &str, out: &mut dyn Write) -> Result<()> {
    let package = index.require(name)?;
    for file in &package.files {
        writeln!(out, "{}", file)?;
    }
    Ok(())
}

/// Name, version, description and files of an installed package
pub fn package(index: &dyn PackageIndex, name: &str, out: &mut dyn Write) -> Result<()> {
    let package = index.require(name)?;
    writeln!(out, "name: {}", package.name)?;
    writeln!(out, "version: {}", package.version)?;
    writeln!(out, "description: {}", package.description)?;
    if !package.sources.is_empty() {
        writeln!(out, "sources:")?;
        for source in &package.sources {
            writeln!(out, "  {}", source)?;
        }
    }
    writeln!(out, "files:")?;
    for file in &package.files {
        writeln!(out, "  {}", file)?;
    }
    Ok(())
}

/// Lifecycle scripts of an installed package
pub fn triggers(index: &dyn PackageIndex, name: &str, out: &mut dyn Write) -> Result<()> {
    let package = index.require(name)?;
    let scripts = [
        ("build", &package.build_logic),
        ("before install", &package.before_install_logic),
        ("after install", &package.after_install_logic),
        ("uninstall", &package.uninstall_logic),
    ];
    for (label, body) in scripts {
        writeln!(out, "{}:", label)?;
        writeln!(out, "{}", body)?;
    }
    Ok(())
}

/// Effective configuration as TOML
pub fn config(config: &Config, out: &mut dyn Write) -> Result<()> {
    write!(out, "{}", config.to_toml()?)?;
    Ok(())
}
