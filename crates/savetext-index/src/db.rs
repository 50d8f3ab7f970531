use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use savetext_types::to_unix_seconds;
use std::path::{Path, PathBuf};

use crate::queries::{log_file, save_text};
use crate::records::{LogFileRecord, SaveRecord};
use crate::schema;
use crate::{Error, Result};

/// Source of audit timestamps (unix seconds).
pub type Clock = fn() -> i64;

pub fn system_clock() -> i64 {
    Utc::now().timestamp()
}

/// Handle owning the connection of one title store.
///
/// The connection is released exactly once, by [`Database::close`] or on drop.
pub struct Database {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    clock: Clock,
}

impl Database {
    /// Open an existing store (or create an empty artifact) without running DDL.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        schema::configure(&conn)?;
        schema::check_version(&conn)?;

        Ok(Self {
            conn: Some(conn),
            path: Some(db_path.to_path_buf()),
            clock: system_clock,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::configure(&conn)?;
        let db = Self {
            conn: Some(conn),
            path: None,
            clock: system_clock,
        };
        db.initialize()?;
        Ok(db)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    /// Create tables and views. Idempotent; required before the first write
    /// to a newly created artifact.
    pub fn initialize(&self) -> Result<()> {
        schema::init_schema(self.conn()?)
    }

    pub fn schema_version(&self) -> Result<i32> {
        schema::schema_version(self.conn()?)
    }

    /// Insert or replace the save keyed by `(log_from, log_at)`.
    pub fn upsert_save(
        &self,
        log_at: DateTime<Utc>,
        text: &str,
        log_from: DateTime<Utc>,
        editor: &str,
    ) -> Result<usize> {
        save_text::upsert(
            self.conn()?,
            to_unix_seconds(&log_from),
            to_unix_seconds(&log_at),
            text,
            editor,
            (self.clock)(),
        )
    }

    /// Insert coverage for `file_name` or widen the stored interval.
    pub fn upsert_coverage(
        &self,
        log_from: DateTime<Utc>,
        log_until: Option<DateTime<Utc>>,
        file_name: &str,
        editor: &str,
    ) -> Result<usize> {
        log_file::upsert(
            self.conn()?,
            file_name,
            to_unix_seconds(&log_from),
            log_until.as_ref().map(to_unix_seconds),
            editor,
            (self.clock)(),
        )
    }

    /// Widen coverage of a file this store already knows; never inserts.
    pub fn update_coverage_only(
        &self,
        log_from: DateTime<Utc>,
        log_until: Option<DateTime<Utc>>,
        file_name: &str,
        editor: &str,
    ) -> Result<usize> {
        log_file::widen_existing(
            self.conn()?,
            file_name,
            to_unix_seconds(&log_from),
            log_until.as_ref().map(to_unix_seconds),
            editor,
            (self.clock)(),
        )
    }

    /// All known log files, most recent first.
    pub fn list_files(&self) -> Result<Vec<String>> {
        log_file::list_names(self.conn()?)
    }

    /// Save timestamps recorded from `file_name`, most recent first.
    pub fn list_timestamps(&self, file_name: &str) -> Result<Vec<DateTime<Utc>>> {
        save_text::list_timestamps(self.conn()?, file_name)
    }

    /// Save text at `log_at`; `None` when nothing was saved at that second.
    pub fn read_save_text(&self, log_at: DateTime<Utc>) -> Result<Option<String>> {
        save_text::read_text(self.conn()?, to_unix_seconds(&log_at))
    }

    pub fn read_save(
        &self,
        log_from: DateTime<Utc>,
        log_at: DateTime<Utc>,
    ) -> Result<Option<SaveRecord>> {
        save_text::get(
            self.conn()?,
            to_unix_seconds(&log_from),
            to_unix_seconds(&log_at),
        )
    }

    pub fn get_coverage(&self, file_name: &str) -> Result<Option<LogFileRecord>> {
        log_file::get(self.conn()?, file_name)
    }

    pub fn count_saves(&self) -> Result<usize> {
        save_text::count(self.conn()?)
    }

    /// Begin an immediate transaction. Dropping the guard without
    /// [`StoreTransaction::commit`] rolls back.
    pub fn transaction(&mut self) -> Result<StoreTransaction<'_>> {
        let clock = self.clock;
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(StoreTransaction { tx, clock })
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn()?.execute_batch("VACUUM")?;
        tracing::debug!(path = ?self.path, "store vacuumed");
        Ok(())
    }

    pub fn analyze(&self) -> Result<()> {
        self.conn()?.execute_batch("ANALYZE")?;
        tracing::debug!(path = ?self.path, "store analyzed");
        Ok(())
    }

    /// Release the connection. Calling again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_conn, err)| Error::from(err))
    }
}

/// Write transaction on one store.
pub struct StoreTransaction<'a> {
    tx: Transaction<'a>,
    clock: Clock,
}

impl StoreTransaction<'_> {
    pub fn upsert_save(
        &self,
        log_at: DateTime<Utc>,
        text: &str,
        log_from: DateTime<Utc>,
        editor: &str,
    ) -> Result<usize> {
        save_text::upsert(
            &self.tx,
            to_unix_seconds(&log_from),
            to_unix_seconds(&log_at),
            text,
            editor,
            (self.clock)(),
        )
    }

    pub fn upsert_coverage(
        &self,
        log_from: DateTime<Utc>,
        log_until: Option<DateTime<Utc>>,
        file_name: &str,
        editor: &str,
    ) -> Result<usize> {
        log_file::upsert(
            &self.tx,
            file_name,
            to_unix_seconds(&log_from),
            log_until.as_ref().map(to_unix_seconds),
            editor,
            (self.clock)(),
        )
    }

    pub fn update_coverage_only(
        &self,
        log_from: DateTime<Utc>,
        log_until: Option<DateTime<Utc>>,
        file_name: &str,
        editor: &str,
    ) -> Result<usize> {
        log_file::widen_existing(
            &self.tx,
            file_name,
            to_unix_seconds(&log_from),
            log_until.as_ref().map(to_unix_seconds),
            editor,
            (self.clock)(),
        )
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savetext_types::from_unix_seconds;

    fn ts(secs: i64) -> DateTime<Utc> {
        from_unix_seconds(secs).unwrap()
    }

    #[test]
    fn test_schema_initialization() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.list_files().unwrap().len(), 0);
        assert_eq!(db.schema_version().unwrap(), crate::SCHEMA_VERSION);
    }

    #[test]
    fn test_upsert_save_returns_one_on_insert_and_replace() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.upsert_save(ts(1050), "S1", ts(1000), "app").unwrap(), 1);
        assert_eq!(db.upsert_save(ts(1050), "S2", ts(1000), "app").unwrap(), 1);
        assert_eq!(db.count_saves().unwrap(), 1);
    }

    #[test]
    fn test_same_log_at_from_two_files_does_not_collide() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_save(ts(1050), "first file", ts(1000), "app").unwrap();
        db.upsert_save(ts(1050), "second file", ts(1040), "app").unwrap();

        assert_eq!(db.count_saves().unwrap(), 2);
        // Most recent file wins on an ambiguous lookup
        assert_eq!(
            db.read_save_text(ts(1050)).unwrap().as_deref(),
            Some("second file")
        );
    }

    #[test]
    fn test_text_with_quotes_is_stored_verbatim() {
        let db = Database::open_in_memory().unwrap();
        let text = r#"it's a "save"; DROP TABLE save_text; --"#;

        db.upsert_save(ts(1050), text, ts(1000), "o'brien").unwrap();

        let record = db.read_save(ts(1000), ts(1050)).unwrap().unwrap();
        assert_eq!(record.text, text);
        assert_eq!(record.created_by, "o'brien");
    }

    #[test]
    fn test_read_missing_save_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.read_save_text(ts(42)).unwrap(), None);
        assert_eq!(db.read_save(ts(1), ts(42)).unwrap(), None);
    }

    #[test]
    fn test_upsert_coverage_reports_unchanged_interval() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(
            db.upsert_coverage(ts(1000), Some(ts(1100)), "a.txt", "app")
                .unwrap(),
            1
        );
        // Narrower interval: nothing to widen
        assert_eq!(
            db.upsert_coverage(ts(1010), Some(ts(1050)), "a.txt", "app")
                .unwrap(),
            0
        );

        let record = db.get_coverage("a.txt").unwrap().unwrap();
        assert_eq!(record.log_from, ts(1000));
        assert_eq!(record.log_until, Some(ts(1100)));
    }

    #[test]
    fn test_unknown_until_never_replaces_known_until() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_coverage(ts(1000), Some(ts(1100)), "a.txt", "app")
            .unwrap();
        db.upsert_coverage(ts(1000), None, "a.txt", "app").unwrap();

        let record = db.get_coverage("a.txt").unwrap().unwrap();
        assert_eq!(record.log_until, Some(ts(1100)));
    }

    #[test]
    fn test_update_coverage_only_ignores_unknown_file() {
        let db = Database::open_in_memory().unwrap();

        let count = db
            .update_coverage_only(ts(1000), Some(ts(2000)), "missing.txt", "app")
            .unwrap();
        assert_eq!(count, 0);
        assert!(db.get_coverage("missing.txt").unwrap().is_none());
    }

    #[test]
    fn test_list_files_most_recent_first() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_coverage(ts(1000), Some(ts(1100)), "old.txt", "app")
            .unwrap();
        db.upsert_coverage(ts(3000), Some(ts(3100)), "new.txt", "app")
            .unwrap();
        db.upsert_coverage(ts(2000), None, "mid.txt", "app").unwrap();

        assert_eq!(
            db.list_files().unwrap(),
            vec!["new.txt", "mid.txt", "old.txt"]
        );
    }

    #[test]
    fn test_list_timestamps_by_file() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_coverage(ts(1000), Some(ts(1100)), "a.txt", "app")
            .unwrap();
        db.upsert_coverage(ts(2000), Some(ts(2100)), "b.txt", "app")
            .unwrap();
        db.upsert_save(ts(1010), "a1", ts(1000), "app").unwrap();
        db.upsert_save(ts(1090), "a2", ts(1000), "app").unwrap();
        db.upsert_save(ts(2050), "b1", ts(2000), "app").unwrap();

        assert_eq!(
            db.list_timestamps("a.txt").unwrap(),
            vec![ts(1090), ts(1010)]
        );
        assert_eq!(db.list_timestamps("b.txt").unwrap(), vec![ts(2050)]);
        assert!(db.list_timestamps("c.txt").unwrap().is_empty());
    }

    #[test]
    fn test_list_timestamps_with_overlapping_coverage() {
        let db = Database::open_in_memory().unwrap();

        db.upsert_coverage(ts(1000), Some(ts(2000)), "a.txt", "app")
            .unwrap();
        db.upsert_coverage(ts(1500), Some(ts(1700)), "b.txt", "app")
            .unwrap();
        db.upsert_save(ts(1100), "a1", ts(1000), "app").unwrap();
        db.upsert_save(ts(1600), "b1", ts(1500), "app").unwrap();

        assert_eq!(db.list_timestamps("a.txt").unwrap(), vec![ts(1100)]);
        assert_eq!(db.list_timestamps("b.txt").unwrap(), vec![ts(1600)]);
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_use() {
        let mut db = Database::open_in_memory().unwrap();

        db.close().unwrap();
        db.close().unwrap();

        assert!(db.is_closed());
        assert!(matches!(db.list_files(), Err(Error::Closed)));
        assert!(matches!(db.transaction(), Err(Error::Closed)));
    }

    #[test]
    fn test_maintenance_runs() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_save(ts(1050), "S1", ts(1000), "app").unwrap();

        db.vacuum().unwrap();
        db.analyze().unwrap();
    }
}
