// SQLite store per title
// One connection per store; save texts keyed by (log_from, log_at), log file coverage keyed by file name

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::{Clock, Database, StoreTransaction, system_clock};
pub use error::{Error, Result};
pub use records::{LogFileRecord, SaveRecord};
pub use schema::SCHEMA_VERSION;

/// Editor name recorded in `created_by` / `updated_by` when none is configured.
pub const DEFAULT_EDITOR: &str = "app";
