use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::ts;
use crate::Result;
use crate::records::SaveRecord;

/// Insert a save, or replace text and audit fields of an existing one.
/// `updated_at` always moves forward on replace, even within one clock second.
/// Returns the number of rows written (1 on both paths).
pub fn upsert(
    conn: &Connection,
    log_from: i64,
    log_at: i64,
    text: &str,
    editor: &str,
    now: i64,
) -> Result<usize> {
    let count = conn.execute(
        r#"
        INSERT INTO save_text (log_from, log_at, text, created_at, created_by, updated_at, updated_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?5)
        ON CONFLICT(log_from, log_at) DO UPDATE SET
            text = excluded.text,
            updated_at = MAX(excluded.updated_at, save_text.updated_at + 1),
            updated_by = excluded.updated_by
        "#,
        params![log_from, log_at, text, now, editor],
    )?;

    Ok(count)
}

pub fn list_timestamps(conn: &Connection, file_name: &str) -> Result<Vec<DateTime<Utc>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT log_at
        FROM v_save_text
        WHERE file_name = ?1
        ORDER BY log_at DESC
        "#,
    )?;

    let raw = stmt
        .query_map([file_name], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    raw.into_iter().map(ts).collect()
}

/// Text of the save at `log_at`. When two files recorded a save at the same
/// second, the one from the most recent file wins.
pub fn read_text(conn: &Connection, log_at: i64) -> Result<Option<String>> {
    let text = conn
        .query_row(
            r#"
            SELECT text
            FROM save_text
            WHERE log_at = ?1
            ORDER BY log_from DESC
            LIMIT 1
            "#,
            [log_at],
            |row| row.get(0),
        )
        .optional()?;

    Ok(text)
}

pub fn get(conn: &Connection, log_from: i64, log_at: i64) -> Result<Option<SaveRecord>> {
    let raw = conn
        .query_row(
            r#"
            SELECT log_from, log_at, text, created_at, created_by, updated_at, updated_by
            FROM save_text
            WHERE log_from = ?1 AND log_at = ?2
            "#,
            params![log_from, log_at],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((log_from, log_at, text, created_at, created_by, updated_at, updated_by)) = raw else {
        return Ok(None);
    };

    Ok(Some(SaveRecord {
        log_from: ts(log_from)?,
        log_at: ts(log_at)?,
        text,
        created_at: ts(created_at)?,
        created_by,
        updated_at: ts(updated_at)?,
        updated_by,
    }))
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM save_text", [], |row| row.get(0))?;
    Ok(count as usize)
}
