// Legacy blob store reader

pub mod decode;
pub mod record;

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::constants::LEGACY_TABLE_PREFERRED;
use crate::error::{FleetError, Result};
use self::record::LegacyUser;

/// One raw row from the legacy key/value table: a distinct key (usually the
/// username) and the user's serialized JSON blob.
#[derive(Debug, Clone)]
pub struct LegacyRow {
    pub key: String,
    pub value: Vec<u8>,
}

/// Open the legacy store read-only. The store is frozen for the duration of
/// a migration run; failing to open it is fatal.
pub fn open_legacy_db(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(FleetError::LegacySource(format!(
            "legacy store not found: {}",
            path.display()
        )));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    Ok(conn)
}

/// Find the key/value table. The historical store always named it
/// "unnamed"; fall back to the first table that has a key and value column.
fn find_table(conn: &Connection) -> Result<String> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name ASC")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if tables.iter().any(|t| t == LEGACY_TABLE_PREFERRED) {
        return Ok(LEGACY_TABLE_PREFERRED.to_string());
    }

    for table in &tables {
        if has_key_value_columns(conn, table)? {
            return Ok(table.clone());
        }
    }

    Err(FleetError::LegacySource(
        "no key/value table found in legacy store".to_string(),
    ))
}

fn has_key_value_columns(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns.iter().any(|c| c == "key") && columns.iter().any(|c| c == "value"))
}

/// Stream every row of the legacy table in one pass, handing each to `f` as
/// the statement advances. Row order is whatever the store hands back;
/// nothing downstream may depend on it. A failure here means the store
/// itself is unreadable, which is fatal.
pub fn for_each_row<F>(conn: &Connection, mut f: F) -> Result<()>
where
    F: FnMut(LegacyRow),
{
    let table = find_table(conn)?;
    let mut stmt = conn.prepare(&format!("SELECT key, value FROM \"{}\"", table))?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        // Values were written as TEXT by some releases and BLOB by others
        let value: Vec<u8> = match row.get_ref(1)? {
            rusqlite::types::ValueRef::Text(bytes) => bytes.to_vec(),
            rusqlite::types::ValueRef::Blob(bytes) => bytes.to_vec(),
            other => format!("{:?}", other).into_bytes(),
        };
        Ok(LegacyRow { key, value })
    })?;
    for row in rows {
        f(row?);
    }
    Ok(())
}

/// Decode one row's JSON payload into the legacy user shape. Malformed rows
/// are the caller's problem to log and skip; they never abort the read.
pub fn decode_row(row: &LegacyRow) -> serde_json::Result<LegacyUser> {
    serde_json::from_slice(&row.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_legacy_store(dir: &TempDir, table: &str, rows: &[(&str, &str)]) -> std::path::PathBuf {
        let path = dir.path().join("legacy.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE \"{}\" (key TEXT PRIMARY KEY, value BLOB)",
            table
        ))
        .unwrap();
        for (key, value) in rows {
            conn.execute(
                &format!("INSERT INTO \"{}\" (key, value) VALUES (?1, ?2)", table),
                rusqlite::params![key, value.as_bytes()],
            )
            .unwrap();
        }
        path
    }

    fn collect_rows(conn: &Connection) -> Vec<LegacyRow> {
        let mut rows = Vec::new();
        for_each_row(conn, |row| rows.push(row)).unwrap();
        rows
    }

    #[test]
    fn test_for_each_row_from_preferred_table() {
        let dir = TempDir::new().unwrap();
        let path = write_legacy_store(
            &dir,
            "unnamed",
            &[("alice", r#"{"username": "alice", "password": "h"}"#)],
        );

        let conn = open_legacy_db(&path).unwrap();
        let rows = collect_rows(&conn);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "alice");

        let user = decode_row(&rows[0]).unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.devices.is_empty());
    }

    #[test]
    fn test_for_each_row_discovers_renamed_table() {
        let dir = TempDir::new().unwrap();
        let path = write_legacy_store(
            &dir,
            "userdata",
            &[("bob", r#"{"username": "bob", "password": "h"}"#)],
        );

        let conn = open_legacy_db(&path).unwrap();
        let rows = collect_rows(&conn);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "bob");
    }

    #[test]
    fn test_malformed_row_fails_decode_but_not_read() {
        let dir = TempDir::new().unwrap();
        let path = write_legacy_store(
            &dir,
            "unnamed",
            &[
                ("good", r#"{"username": "good", "password": "h"}"#),
                ("bad", "{not json"),
            ],
        );

        let conn = open_legacy_db(&path).unwrap();
        let rows = collect_rows(&conn);
        assert_eq!(rows.len(), 2, "read must hand over malformed rows too");

        let decoded: Vec<bool> = rows.iter().map(|r| decode_row(r).is_ok()).collect();
        assert_eq!(decoded.iter().filter(|ok| **ok).count(), 1);
    }

    #[test]
    fn test_open_missing_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = open_legacy_db(&dir.path().join("nope.db"));
        assert!(matches!(result, Err(FleetError::LegacySource(_))));
    }
}
