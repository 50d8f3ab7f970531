use chrono::{DateTime, Utc};

/// One save text row.
///
/// Identity is `(log_from, log_at)`; a later write with the same key
/// replaces `text` and the `updated_*` audit fields.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SaveRecord {
    /// Start of the log file that produced this save.
    pub log_from: DateTime<Utc>,
    /// When the save occurred.
    pub log_at: DateTime<Utc>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Coverage interval of one log file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LogFileRecord {
    pub file_name: String,
    pub log_from: DateTime<Utc>,
    /// Unknown until a later line of the file has been observed.
    pub log_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}
