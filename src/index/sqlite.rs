// src/index/sqlite.rs

//! SQLite-backed index
//!
//! Stores the same serialized manifests as [`super::DirectoryIndex`], keyed
//! by package name in a single `packages` table.

use super::{PackageIndex, schema};
use crate::definition::{self, PackageDefinition};
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

/// Index stored in a SQLite database file
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Open (or create) the index database at `db_path` and migrate it
    pub fn open(db_path: &Path) -> Result<Self> {
        debug!("Opening index database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        schema::migrate(&conn)?;

        Ok(Self { conn })
    }

    /// In-memory index, mostly useful for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }
}

impl PackageIndex for SqliteIndex {
    fn list(&self) -> Result<Vec<PackageDefinition>> {
        let mut stmt = self
            .conn
            .prepare("SELECT manifest FROM packages ORDER BY name")?;

        let manifests = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        manifests.iter().map(|m| definition::parse(m)).collect()
    }

    fn get(&self, name: &str) -> Result<Option<PackageDefinition>> {
        let manifest: Option<String> = self
            .conn
            .query_row(
                "SELECT manifest FROM packages WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        manifest.as_deref().map(definition::parse).transpose()
    }

    fn insert(&self, definition: &PackageDefinition) -> Result<()> {
        definition::validate_name(&definition.name)?;
        if self.contains(&definition.name)? {
            return Err(Error::AlreadyInstalled(definition.name.clone()));
        }

        let manifest = definition::serialize(definition)?;
        self.conn.execute(
            "INSERT INTO packages (name, version, manifest) VALUES (?1, ?2, ?3)",
            params![&definition.name, &definition.version, &manifest],
        )?;
        debug!("Indexed {} in database", definition.name);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM packages WHERE name = ?1", [name])?;
        if deleted == 0 {
            return Err(Error::NotFoundError(format!(
                "Package '{}' is not installed",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package(name: &str) -> PackageDefinition {
        let mut def = PackageDefinition::new(name, "1.0");
        def.description = "test package".to_string();
        def.files = vec!["usr".to_string(), "usr/bin".to_string()];
        def
    }

    #[test]
    fn test_insert_get_remove() {
        let index = SqliteIndex::open_in_memory().unwrap();

        index.insert(&package("foo")).unwrap();
        assert_eq!(index.get("foo").unwrap().unwrap(), package("foo"));

        index.remove("foo").unwrap();
        assert!(index.get("foo").unwrap().is_none());
        assert!(matches!(index.remove("foo"), Err(Error::NotFoundError(_))));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index.insert(&package("foo")).unwrap();
        assert!(matches!(
            index.insert(&package("foo")),
            Err(Error::AlreadyInstalled(_))
        ));
    }

    #[test]
    fn test_list_ordered_by_name() {
        let index = SqliteIndex::open_in_memory().unwrap();
        index.insert(&package("zlib")).unwrap();
        index.insert(&package("bash")).unwrap();

        let names: Vec<String> = index.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["bash", "zlib"]);
    }

    #[test]
    fn test_persists_across_open() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested/index.db");

        SqliteIndex::open(&db_path)
            .unwrap()
            .insert(&package("foo"))
            .unwrap();

        let reopened = SqliteIndex::open(&db_path).unwrap();
        assert!(reopened.contains("foo").unwrap());
    }
}
