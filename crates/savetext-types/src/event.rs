use crate::Title;
use crate::util::file_name_of;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Time span a log file is known to cover.
///
/// `log_until` is absent while only the first line of the file has been seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpan {
    pub file_path: PathBuf,
    pub log_from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_until: Option<DateTime<Utc>>,
}

impl FileSpan {
    pub fn new(file_path: impl Into<PathBuf>, log_from: DateTime<Utc>) -> Self {
        Self {
            file_path: file_path.into(),
            log_from,
            log_until: None,
        }
    }

    pub fn until(mut self, log_until: DateTime<Utc>) -> Self {
        self.log_until = Some(log_until);
        self
    }

    /// Bare file name used as the coverage key.
    pub fn file_name(&self) -> String {
        file_name_of(&self.file_path)
    }

    /// Widen the span so that it covers `other`. Never shrinks.
    pub fn widen(&mut self, other: &FileSpan) {
        self.log_from = self.log_from.min(other.log_from);
        self.log_until = match (self.log_until, other.log_until) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Extend `log_until` to at least `at`.
    pub fn extend_to(&mut self, at: DateTime<Utc>) {
        if self.log_until.is_none_or(|until| until < at) {
            self.log_until = Some(at);
        }
    }
}

/// Save data detected in a log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveEvent {
    pub title: Title,
    pub log_at: DateTime<Utc>,
    pub text: String,
}

/// Event emitted by a log parser or watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    FileOpened {
        #[serde(flatten)]
        file: FileSpan,
    },
    Saved(SaveEvent),
    FileClosed {
        #[serde(flatten)]
        file: FileSpan,
    },
}

impl LogEvent {
    /// Decode one line of a JSON Lines event stream.
    pub fn from_json_line(line: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn to_json_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
