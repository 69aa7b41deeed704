// src/definition/mod.rs

//! Package definitions
//!
//! A definition describes one package: metadata, source URLs, the four
//! lifecycle scripts and (once built) the list of files it owns. The text
//! format lives in [`codec`].

pub mod codec;

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Component, Path};

pub use codec::{parse, serialize};

/// Conventional extension of definition files, also used for index entries
pub const DEFINITION_FILE_EXTENSION: &str = "elplan";

/// Structured description of a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDefinition {
    pub name: String,
    pub version: String,
    pub description: String,
    pub sources: Vec<String>,
    pub build_logic: String,
    pub before_install_logic: String,
    pub after_install_logic: String,
    pub uninstall_logic: String,
    /// Root-relative paths owned by the package, in walk order
    pub files: Vec<String>,
}

/// Contents of the `META` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub struct PackageMetadata {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl PackageDefinition {
    /// Create a definition with metadata only; scripts and files start empty
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Read and parse a definition file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read definition {}: {}", path.display(), e))
        })?;
        parse(&content)
    }

    /// Serialize and write this definition to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = serialize(self)?;
        fs::write(path, content).map_err(|e| {
            Error::IoError(format!("Failed to write definition {}: {}", path.display(), e))
        })
    }

    pub fn metadata(&self) -> PackageMetadata {
        PackageMetadata {
            name: self.name.clone(),
            version: self.version.clone(),
            sources: self.sources.clone(),
        }
    }

    /// Check that the definition can be installed and later uninstalled
    ///
    /// Every lifecycle hook except `BUILD` must be present and the file list
    /// must be non-empty. File entries must stay inside the install root.
    pub fn validate_complete(&self) -> Result<()> {
        let missing = |reason: &str| Error::IncompleteDefinition {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.before_install_logic.is_empty() {
            return Err(missing("missing before install script"));
        }
        if self.after_install_logic.is_empty() {
            return Err(missing("missing after install script"));
        }
        if self.uninstall_logic.is_empty() {
            return Err(missing("missing uninstall script"));
        }
        if self.files.is_empty() {
            return Err(missing("missing file list"));
        }

        self.validate_files()
    }

    /// Reject file entries that are absolute or climb out of the root
    pub fn validate_files(&self) -> Result<()> {
        for file in &self.files {
            validate_relative_path(file)?;
        }
        Ok(())
    }
}

/// Check that a package name can be used as a single file name component
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::ParseError("package name is empty".to_string()));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(Error::ParseError(format!(
            "package name '{}' is not a valid file name",
            name
        )));
    }
    Ok(())
}

/// Check that `path` is relative and contains no `..` components
pub fn validate_relative_path(path: &str) -> Result<()> {
    let safe = !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(Error::InvalidPath(format!(
            "'{}' is not a relative path inside the install root",
            path
        )));
    }
    Ok(())
}

/// Accept any YAML scalar for string fields (`version: 1.0` is common)
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PackageDefinition {
        PackageDefinition {
            before_install_logic: "echo b".to_string(),
            after_install_logic: "echo a".to_string(),
            uninstall_logic: "echo u".to_string(),
            files: vec!["bin".to_string(), "bin/foo".to_string()],
            ..PackageDefinition::new("foo", "1.0")
        }
    }

    #[test]
    fn test_complete_definition_validates() {
        assert!(complete().validate_complete().is_ok());
    }

    #[test]
    fn test_missing_uninstall_script_is_incomplete() {
        let mut def = complete();
        def.uninstall_logic.clear();

        let err = def.validate_complete().unwrap_err();
        assert!(matches!(err, Error::IncompleteDefinition { .. }));
        assert!(err.to_string().contains("uninstall"));
    }

    #[test]
    fn test_missing_file_list_is_incomplete() {
        let mut def = complete();
        def.files.clear();
        assert!(def.validate_complete().is_err());
    }

    #[test]
    fn test_escaping_file_entries_rejected() {
        let mut def = complete();
        def.files.push("../etc/passwd".to_string());
        assert!(matches!(
            def.validate_complete(),
            Err(Error::InvalidPath(_))
        ));

        def.files = vec!["/etc/passwd".to_string()];
        assert!(def.validate_files().is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("foo-1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
    }

    #[test]
    fn test_metadata_accepts_numeric_version() {
        let meta: PackageMetadata = serde_yaml::from_str("name: foo\nversion: 2\n").unwrap();
        assert_eq!(meta.version, "2");
        assert!(meta.sources.is_empty());
    }
}
