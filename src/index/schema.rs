// src/index/schema.rs

//! SQLite schema and migrations for the database-backed index
//!
//! Migration `n` is `MIGRATIONS[n - 1]`. Each one runs in its own
//! transaction together with the row recording it in `schema_version`.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

const MIGRATIONS: &[&str] = &[
    // 1: one row per installed package holding its manifest
    "CREATE TABLE packages (
        name TEXT PRIMARY KEY NOT NULL,
        version TEXT NOT NULL,
        manifest TEXT NOT NULL,
        installed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );",
];

/// Schema version a fully migrated index has
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Schema version recorded in the database, 0 for a fresh one
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Bring the index up to [`SCHEMA_VERSION`]
///
/// An index written by a newer build is refused rather than read.
pub fn migrate(conn: &Connection) -> Result<()> {
    let current = get_schema_version(conn)?;
    debug!("Current index schema version: {}", current);

    if current > SCHEMA_VERSION {
        return Err(Error::SchemaError(format!(
            "index schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    for version in (current + 1)..=SCHEMA_VERSION {
        info!("Applying index migration to version {}", version);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration(version)?)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    Ok(())
}

fn migration(version: i32) -> Result<&'static str> {
    usize::try_from(version - 1)
        .ok()
        .and_then(|i| MIGRATIONS.get(i))
        .copied()
        .ok_or_else(|| Error::SchemaError(format!("no migration to version {}", version)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let tables: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'packages'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_unknown_migration_is_error() {
        assert!(matches!(migration(0), Err(Error::SchemaError(_))));
        assert!(matches!(
            migration(SCHEMA_VERSION + 1),
            Err(Error::SchemaError(_))
        ));
        assert!(migration(SCHEMA_VERSION).is_ok());
    }

    #[test]
    fn test_newer_database_refused() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION + 1],
        )
        .unwrap();

        assert!(matches!(migrate(&conn), Err(Error::SchemaError(_))));
    }
}
