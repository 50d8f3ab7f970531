//! Ingestion and persistence runtime for savetext
//!
//! Owns the per-title store registry, routes parser events to stores,
//! runs batch loads and watch mode, and exposes the read-only title view.

pub mod config;
pub mod error;
pub mod gate;
pub mod ingest;
pub mod manager;
pub mod ops;
pub mod registry;
pub mod source;
pub mod view;
pub mod watch;

pub use config::{Config, resolve_data_dir};
pub use error::{Error, Result};
pub use gate::{IngestGate, IngestGuard};
pub use ingest::{
    BatchProgress, BatchReport, BatchRunner, CancelToken, EventOutcome, FailedFile,
    IngestCoordinator, IngestReport, IngestState, SkipReason,
};
pub use manager::SaveTextManager;
pub use ops::{MaintenanceProgress, maintain};
pub use registry::{StoreRef, StoreRegistry};
pub use source::{JsonlEventSource, LogEventSource, MemoryEventSource, discover_event_files};
pub use view::TitleView;
pub use watch::{WatchConfig, WatchEvent, WatchService};
