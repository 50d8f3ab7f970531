pub mod log_file;
pub mod save_text;

use chrono::{DateTime, Utc};

use crate::Result;

pub(crate) fn ts(secs: i64) -> Result<DateTime<Utc>> {
    Ok(savetext_types::from_unix_seconds(secs)?)
}
