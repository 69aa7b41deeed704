// src/archive.rs

//! Package archive format
//!
//! A package archive is an uncompressed tar holding two entries:
//!
//! - `manifest`: the serialized package definition, with `FILES` populated
//! - `files.tar`: a nested tar of the package payload, with paths relative to
//!   the install root
//!
//! Keeping the payload in its own tar lets the manifest be read without
//! extracting the payload.

use crate::definition::{self, PackageDefinition};
use crate::error::{Error, Result};
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the manifest entry inside a package archive
pub const MANIFEST_FILE_NAME: &str = "manifest";

/// Name of the nested payload tar inside a package archive
pub const PAYLOAD_FILE_NAME: &str = "files.tar";

/// Default extension for package archives
pub const ARCHIVE_FILE_EXTENSION: &str = "tar";

/// Mode for directories created during extraction
const DIR_MODE: u32 = 0o755;

/// List every path below `dir` relative to it, in lexical walk order
///
/// Directories are included, `dir` itself is not.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            Error::IoError(format!("Failed to walk {}: {}", dir.display(), e))
        })?;
        let rel = entry.path().strip_prefix(dir).map_err(|_| {
            Error::InvalidPath(format!("{} is outside {}", entry.path().display(), dir.display()))
        })?;
        files.push(rel.to_string_lossy().replace('\\', "/"));
    }
    Ok(files)
}

/// Pack `source_dir` into a package archive at `output`
///
/// The walk of `source_dir` becomes `definition.files`. `work_dir` receives
/// the intermediate manifest and payload tar.
pub fn pack(
    source_dir: &Path,
    work_dir: &Path,
    output: &Path,
    definition: &mut PackageDefinition,
) -> Result<()> {
    info!("Packing {} into {}", source_dir.display(), output.display());

    let files = list_files(source_dir)?;
    let payload_path = work_dir.join(PAYLOAD_FILE_NAME);
    write_payload(source_dir, &files, &payload_path)?;

    definition.files = files;
    let manifest_path = work_dir.join(MANIFEST_FILE_NAME);
    definition.write_to(&manifest_path)?;

    let out = File::create(output).map_err(|e| {
        Error::IoError(format!("Failed to create archive {}: {}", output.display(), e))
    })?;
    let mut builder = Builder::new(out);
    builder.append_path_with_name(&manifest_path, MANIFEST_FILE_NAME)?;
    builder.append_path_with_name(&payload_path, PAYLOAD_FILE_NAME)?;
    builder.finish()?;

    debug!(
        "Packed {} entries for {} {}",
        definition.files.len(),
        definition.name,
        definition.version
    );
    Ok(())
}

/// Write the payload tar: one entry per relative path, in the given order
///
/// Symlinks are stored as the file or directory they point to, so every
/// listed path is extracted on install.
fn write_payload(source_dir: &Path, files: &[String], output: &Path) -> Result<()> {
    let out = File::create(output).map_err(|e| {
        Error::IoError(format!("Failed to create payload {}: {}", output.display(), e))
    })?;
    let mut builder = Builder::new(out);

    for rel in files {
        let path = source_dir.join(rel);
        let metadata = fs::metadata(&path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        if metadata.is_dir() {
            builder.append_dir(rel, &path)?;
        } else {
            builder.append_path_with_name(&path, rel)?;
        }
    }

    builder.finish()?;
    Ok(())
}

/// Extract a tar archive into `dest_root`
///
/// Directories are created only when absent, regular files are created or
/// overwritten with the stored permission bits, and every other entry type
/// is skipped. Returns the relative paths that were extracted.
pub fn unpack(archive_path: &Path, dest_root: &Path) -> Result<Vec<String>> {
    info!("Extracting {} to {}", archive_path.display(), dest_root.display());

    let file = File::open(archive_path).map_err(|e| {
        Error::IoError(format!("Failed to open archive {}: {}", archive_path.display(), e))
    })?;
    let mut archive = Archive::new(file);
    let mut extracted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let rel: PathBuf = entry.path()?.into_owned();
        let rel_str = rel.to_string_lossy().into_owned();
        definition::validate_relative_path(&rel_str)?;

        let target = dest_root.join(&rel);
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            if !target.exists() {
                DirBuilder::new()
                    .recursive(true)
                    .mode(DIR_MODE)
                    .create(&target)
                    .map_err(|e| {
                        Error::IoError(format!(
                            "Failed to create directory {}: {}",
                            target.display(),
                            e
                        ))
                    })?;
            }
        } else if entry_type.is_file() {
            let mode = entry.header().mode()? & 0o7777;
            if let Some(parent) = target.parent() {
                if !parent.exists() {
                    DirBuilder::new().recursive(true).mode(DIR_MODE).create(parent)?;
                }
            }
            write_entry(&mut entry, &target, mode)?;
        } else {
            debug!("Skipping {:?} entry {}", entry_type, rel_str);
            continue;
        }

        extracted.push(rel_str);
    }

    Ok(extracted)
}

fn write_entry(reader: &mut impl Read, target: &Path, mode: u32) -> Result<()> {
    let mut out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(target)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {}", target.display(), e)))?;
    io::copy(reader, &mut out)?;
    fs::set_permissions(target, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Read the manifest of a package archive without extracting anything
pub fn read_manifest(archive_path: &Path) -> Result<PackageDefinition> {
    let file = File::open(archive_path).map_err(|e| {
        Error::IoError(format!("Failed to open archive {}: {}", archive_path.display(), e))
    })?;
    let mut archive = Archive::new(file);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_manifest = entry.path()?.as_os_str() == MANIFEST_FILE_NAME;
        if is_manifest {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            return definition::parse(&content);
        }
    }

    Err(Error::NotFoundError(format!(
        "No {} in archive {}",
        MANIFEST_FILE_NAME,
        archive_path.display()
    )))
}
