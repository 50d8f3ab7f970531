//! Diagnostic logging to stderr
//!
//! `RUST_LOG` overrides the `--log-level` flag; `SAVETEXT_LOG_FORMAT=json`
//! switches to one JSON object per line.

use crate::types::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let is_json = std::env::var("SAVETEXT_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn default_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,savetext={level},savetext_runtime={level},savetext_index={level}"
    ))
}
