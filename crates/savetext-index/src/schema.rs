use rusqlite::Connection;
use std::time::Duration;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 2;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// NOTE: Store layout
//
// save_text is keyed by (log_from, log_at): log_from identifies the log file that
// produced the save, so equal save timestamps from two files never collide.
// logfile holds one coverage interval per file name; writers only ever widen it.
// v_save_text attributes each save to exactly one file: the latest-starting
// file that starts at or before the save's log_from. Coverage intervals of
// concurrent sessions may overlap, so containment alone is ambiguous.
// All timestamps are unix seconds (UTC).

/// Connection settings applied on every open.
pub fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // journal_mode returns a row, so it cannot go through execute_batch
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute_batch(
        r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        "#,
    )?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Refuse stores written by a different schema version. Version 0 means
/// the store has not been initialized yet.
pub fn check_version(conn: &Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found != 0 && found != SCHEMA_VERSION {
        return Err(Error::SchemaVersion {
            found,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(())
}

/// Create tables, indexes and views. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS save_text (
            log_from INTEGER NOT NULL,
            log_at INTEGER NOT NULL,
            text TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            created_by TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            updated_by TEXT NOT NULL,
            PRIMARY KEY (log_from, log_at)
        );

        CREATE TABLE IF NOT EXISTS logfile (
            file_name TEXT PRIMARY KEY,
            log_from INTEGER NOT NULL,
            log_until INTEGER,
            created_at INTEGER NOT NULL,
            created_by TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            updated_by TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_save_text_log_at ON save_text(log_at DESC);
        CREATE INDEX IF NOT EXISTS idx_logfile_log_from ON logfile(log_from DESC);

        CREATE VIEW IF NOT EXISTS v_save_text AS
        SELECT
            l.file_name,
            s.log_from,
            s.log_at,
            s.text,
            s.updated_at
        FROM save_text s
        JOIN logfile l
            ON l.file_name = (
                SELECT f.file_name
                FROM logfile f
                WHERE f.log_from <= s.log_from
                ORDER BY f.log_from DESC, f.file_name DESC
                LIMIT 1
            );
        "#,
    )
    .map_err(Error::Schema)?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])
        .map_err(Error::Schema)?;

    Ok(())
}
