#![forbid(unsafe_code)]

mod sql;

use super::super::StoreError;
use rusqlite::{Connection, OptionalExtension, params};

pub(in crate::store) const SCHEMA_VERSION: &str = "1";

pub(in crate::store) fn migrate_sqlite_schema(conn: &Connection) -> Result<(), StoreError> {
    let stored = conn
        .query_row(
            "SELECT value FROM meta WHERE key='schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional();
    // A missing meta table simply means a fresh database.
    if let Ok(Some(stored)) = stored
        && stored != SCHEMA_VERSION
    {
        return Err(StoreError::StorageUnavailable(format!(
            "unsupported schema version {stored} (expected {SCHEMA_VERSION})"
        )));
    }

    conn.execute_batch(&sql::full_schema_sql())?;

    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;

    Ok(())
}
