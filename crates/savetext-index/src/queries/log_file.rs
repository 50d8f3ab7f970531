use rusqlite::{Connection, OptionalExtension, params};

use super::ts;
use crate::Result;
use crate::records::LogFileRecord;

// MIN/MAX return NULL when any argument is NULL, so log_until goes through
// COALESCE on both sides: an unknown bound never replaces a known one.

/// Insert coverage for a file, or widen the stored interval.
/// Audit fields change only when the interval does; returns 0 otherwise.
pub fn upsert(
    conn: &Connection,
    file_name: &str,
    log_from: i64,
    log_until: Option<i64>,
    editor: &str,
    now: i64,
) -> Result<usize> {
    let count = conn.execute(
        r#"
        INSERT INTO logfile (file_name, log_from, log_until, created_at, created_by, updated_at, updated_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?5)
        ON CONFLICT(file_name) DO UPDATE SET
            log_from = MIN(logfile.log_from, excluded.log_from),
            log_until = MAX(
                COALESCE(logfile.log_until, excluded.log_until),
                COALESCE(excluded.log_until, logfile.log_until)
            ),
            updated_at = excluded.updated_at,
            updated_by = excluded.updated_by
        WHERE excluded.log_from < logfile.log_from
            OR (excluded.log_until IS NOT NULL
                AND (logfile.log_until IS NULL OR excluded.log_until > logfile.log_until))
        "#,
        params![file_name, log_from, log_until, now, editor],
    )?;

    Ok(count)
}

/// Widen an existing coverage row; files unknown to this store are left alone.
pub fn widen_existing(
    conn: &Connection,
    file_name: &str,
    log_from: i64,
    log_until: Option<i64>,
    editor: &str,
    now: i64,
) -> Result<usize> {
    let count = conn.execute(
        r#"
        UPDATE logfile SET
            log_from = MIN(log_from, ?2),
            log_until = MAX(COALESCE(log_until, ?3), COALESCE(?3, log_until)),
            updated_at = ?4,
            updated_by = ?5
        WHERE file_name = ?1
            AND (?2 < log_from
                OR (?3 IS NOT NULL AND (log_until IS NULL OR ?3 > log_until)))
        "#,
        params![file_name, log_from, log_until, now, editor],
    )?;

    Ok(count)
}

/// File names, most recent first.
pub fn list_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT file_name
        FROM logfile
        ORDER BY log_from DESC, file_name DESC
        "#,
    )?;

    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    Ok(names)
}

pub fn get(conn: &Connection, file_name: &str) -> Result<Option<LogFileRecord>> {
    let raw = conn
        .query_row(
            r#"
            SELECT file_name, log_from, log_until, created_at, created_by, updated_at, updated_by
            FROM logfile
            WHERE file_name = ?1
            "#,
            [file_name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((file_name, log_from, log_until, created_at, created_by, updated_at, updated_by)) =
        raw
    else {
        return Ok(None);
    };

    Ok(Some(LogFileRecord {
        file_name,
        log_from: ts(log_from)?,
        log_until: log_until.map(ts).transpose()?,
        created_at: ts(created_at)?,
        created_by,
        updated_at: ts(updated_at)?,
        updated_by,
    }))
}
