use rusqlite::ErrorCode;
use std::fmt;

/// Result type for savetext-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// DDL failed while initializing a store
    Schema(rusqlite::Error),

    /// Store was written by an incompatible schema version
    SchemaVersion { found: i32, expected: i32 },

    /// Store artifact unreadable, locked, corrupt or out of space
    Storage(rusqlite::Error),

    /// Uniqueness or NOT NULL constraint rejected a write
    Constraint(rusqlite::Error),

    /// Any other database operation failure
    Database(rusqlite::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Stored timestamp could not be decoded
    Timestamp(savetext_types::Error),

    /// Operation on a handle that has been closed
    Closed,
}

impl Error {
    /// True for failures of the underlying artifact (locked, unreadable, disk).
    pub fn is_storage_io(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Schema(err) => write!(f, "Schema error: {}", err),
            Error::SchemaVersion { found, expected } => write!(
                f,
                "Schema error: store has version {}, expected {}",
                found, expected
            ),
            Error::Storage(err) => write!(f, "Storage IO error: {}", err),
            Error::Constraint(err) => write!(f, "Constraint violation: {}", err),
            Error::Database(err) => {
                let msg = err.to_string();
                // Missing tables usually mean the artifact was never initialized
                if msg.contains("no such column") || msg.contains("no such table") {
                    write!(
                        f,
                        "Database schema mismatch: {}. Remove the store file to recreate it.",
                        msg
                    )
                } else {
                    write!(f, "Database error: {}", err)
                }
            }
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Timestamp(err) => write!(f, "Stored timestamp error: {}", err),
            Error::Closed => write!(f, "Store handle is closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Schema(err)
            | Error::Storage(err)
            | Error::Constraint(err)
            | Error::Database(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Timestamp(err) => Some(err),
            Error::SchemaVersion { .. } | Error::Closed => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::NotADatabase
                | ErrorCode::CannotOpen
                | ErrorCode::DiskFull
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied,
            ) => Error::Storage(err),
            Some(ErrorCode::ConstraintViolation) => Error::Constraint(err),
            _ => Error::Database(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<savetext_types::Error> for Error {
    fn from(err: savetext_types::Error) -> Self {
        Error::Timestamp(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32, msg: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), Some(msg.to_string()))
    }

    #[test]
    fn test_busy_is_storage_io() {
        let err = Error::from(sqlite_failure(rusqlite::ffi::SQLITE_BUSY, "database is locked"));
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.is_storage_io());
    }

    #[test]
    fn test_constraint_is_classified() {
        let err = Error::from(sqlite_failure(
            rusqlite::ffi::SQLITE_CONSTRAINT,
            "UNIQUE constraint failed",
        ));
        assert!(matches!(err, Error::Constraint(_)));
        assert!(!err.is_storage_io());
    }

    #[test]
    fn test_schema_mismatch_error_message() {
        let err = Error::from(sqlite_failure(1, "no such table: save_text"));
        let msg = err.to_string();

        assert!(msg.contains("Database schema mismatch"));
        assert!(msg.contains("recreate"));
    }
}
