use savetext_types::Title;
use std::fmt;

/// Result type for savetext-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Store operation failed for a title
    Index {
        title: Title,
        source: savetext_index::Error,
    },

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// Event source produced something unusable
    Source { file: String, message: String },

    /// Another ingestion unit is in flight
    Busy,

    /// Stopped on request between files
    Cancelled,

    /// At least one file of a batch failed
    BatchFailed { failed: usize, total: usize },

    /// File watcher could not be set up
    Watch(notify::Error),
}

impl Error {
    pub fn index(title: Title) -> impl FnOnce(savetext_index::Error) -> Error {
        move |source| Error::Index { title, source }
    }

    pub fn event_source(file: impl Into<String>, message: impl fmt::Display) -> Error {
        Error::Source {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Title whose store failed, when the failure came from a store.
    pub fn title(&self) -> Option<Title> {
        match self {
            Error::Index { title, .. } => Some(*title),
            _ => None,
        }
    }

    /// Artifact-level failure (locked, unreadable, disk) of a store.
    pub fn is_storage_io(&self) -> bool {
        matches!(self, Error::Index { source, .. } if source.is_storage_io())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Index { title, source } => write!(f, "{} store: {}", title, source),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Source { file, message } => write!(f, "Event source error in {}: {}", file, message),
            Error::Busy => write!(f, "Another ingestion is already running"),
            Error::Cancelled => write!(f, "Ingestion cancelled"),
            Error::BatchFailed { failed, total } => {
                write!(f, "{} of {} files failed to ingest", failed, total)
            }
            Error::Watch(err) => write!(f, "Watch error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Index { source, .. } => Some(source),
            Error::Io(err) => Some(err),
            Error::Watch(err) => Some(err),
            Error::Config(_)
            | Error::Source { .. }
            | Error::Busy
            | Error::Cancelled
            | Error::BatchFailed { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
