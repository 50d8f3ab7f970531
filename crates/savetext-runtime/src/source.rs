use savetext_types::{LogEvent, file_name_of};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Extension of event streams written by the log parser.
pub const EVENT_FILE_EXTENSION: &str = "jsonl";

/// Pull-based producer of parser events for one ingestion unit.
pub trait LogEventSource {
    /// Name used in progress reports and error context.
    fn name(&self) -> &str;

    /// Next event, or `None` once the source is exhausted.
    fn next_event(&mut self) -> Result<Option<LogEvent>>;
}

/// One serialized `LogEvent` per line.
pub struct JsonlEventSource {
    name: String,
    lines: std::io::Lines<BufReader<File>>,
    line_no: usize,
}

impl JsonlEventSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            name: file_name_of(path),
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl LogEventSource for JsonlEventSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_event(&mut self) -> Result<Option<LogEvent>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            return LogEvent::from_json_line(&line).map(Some).map_err(|err| {
                Error::event_source(&self.name, format!("line {}: {}", self.line_no, err))
            });
        }
        Ok(None)
    }
}

/// In-memory event queue.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    name: String,
    events: VecDeque<LogEvent>,
}

impl MemoryEventSource {
    pub fn new(name: impl Into<String>, events: impl IntoIterator<Item = LogEvent>) -> Self {
        Self {
            name: name.into(),
            events: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, event: LogEvent) {
        self.events.push_back(event);
    }
}

impl LogEventSource for MemoryEventSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_event(&mut self) -> Result<Option<LogEvent>> {
        Ok(self.events.pop_front())
    }
}

/// Event streams directly inside `dir`, sorted by file name.
pub fn discover_event_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "Event directory not found: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_event_file(path))
        .collect();

    files.sort_by_key(|path| file_name_of(path));
    Ok(files)
}

pub(crate) fn is_event_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(EVENT_FILE_EXTENSION)
}
