use std::fmt;

/// Result type for savetext-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// Unknown title identifier
    UnknownTitle(String),

    /// Timestamp outside the representable range
    InvalidTimestamp(i64),

    /// Event line could not be decoded
    Decode(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownTitle(name) => write!(f, "Unknown title: {}", name),
            Error::InvalidTimestamp(secs) => write!(f, "Invalid unix timestamp: {}", secs),
            Error::Decode(err) => write!(f, "Event decode error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            Error::UnknownTitle(_) | Error::InvalidTimestamp(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err)
    }
}
