//! Shared fixture for CLI integration tests.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use chrono::{DateTime, Utc};
use savetext_types::{FileSpan, LogEvent, SaveEvent, Title, from_unix_seconds};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        let log_dir = temp_dir.path().join("events");

        fs::create_dir_all(&log_dir).expect("Failed to create log dir");

        Self {
            _temp_dir: temp_dir,
            data_dir,
            log_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Write an event stream into the log directory and return its path.
    pub fn write_stream(&self, name: &str, events: &[LogEvent]) -> PathBuf {
        let content: String = events
            .iter()
            .map(|event| format!("{}\n", event.to_json_line().expect("encode event")))
            .collect();
        let path = self.log_dir.join(name);
        fs::write(&path, content).expect("Failed to write stream");
        path
    }

    pub fn command(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("savetext");
        cmd.env_remove("RUST_LOG")
            .env_remove("SAVETEXT_DATA_DIR")
            .arg("--data-dir")
            .arg(self.data_dir());
        cmd
    }
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    from_unix_seconds(secs).expect("valid timestamp")
}

pub fn opened(name: &str, from: i64) -> LogEvent {
    LogEvent::FileOpened {
        file: FileSpan::new(name, ts(from)),
    }
}

pub fn saved(title: Title, at: i64, text: &str) -> LogEvent {
    LogEvent::Saved(SaveEvent {
        title,
        log_at: ts(at),
        text: text.to_string(),
    })
}

pub fn closed(name: &str, from: i64, until: i64) -> LogEvent {
    LogEvent::FileClosed {
        file: FileSpan::new(name, ts(from)).until(ts(until)),
    }
}
