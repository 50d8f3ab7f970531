use savetext_types::Title;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::gate::IngestGate;
use crate::ingest::{BatchProgress, BatchReport, BatchRunner, CancelToken};
use crate::ops::{MaintenanceProgress, maintain};
use crate::registry::StoreRegistry;
use crate::source::discover_event_files;
use crate::view::TitleView;
use crate::watch::{WatchConfig, WatchService};
use crate::{Error, Result};

/// Entry point bundling configuration, the store registry and the
/// ingestion gate. Construct once per process and call
/// [`SaveTextManager::shutdown`] before exit.
pub struct SaveTextManager {
    data_dir: PathBuf,
    config: Config,
    registry: Arc<StoreRegistry>,
    gate: Arc<IngestGate>,
}

impl SaveTextManager {
    /// Load `config.toml` from `data_dir` (defaults when absent).
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let config = Config::load_from(&Config::path_in(&data_dir))?;
        Ok(Self::new(data_dir, config))
    }

    pub fn new(data_dir: impl Into<PathBuf>, config: Config) -> Self {
        let data_dir = data_dir.into();
        let registry = Arc::new(StoreRegistry::new(&data_dir));
        Self {
            data_dir,
            config,
            registry,
            gate: Arc::new(IngestGate::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &IngestGate {
        &self.gate
    }

    /// Event streams in the configured log directory.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let log_dir = self.config.log_dir.as_deref().ok_or_else(|| {
            Error::Config("log_dir is not set; pass files explicitly or set log_dir".to_string())
        })?;
        discover_event_files(log_dir)
    }

    pub fn load_files<F>(
        &self,
        files: &[PathBuf],
        cancel: CancelToken,
        on_progress: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(BatchProgress),
    {
        BatchRunner::new(&self.registry, &self.gate, self.config.editor.as_str())
            .with_cancel(cancel)
            .run(files, on_progress)
    }

    /// Start watch mode on `dir`, or on the configured log directory.
    pub fn watch(&self, dir: Option<PathBuf>) -> Result<WatchService> {
        let dir = dir
            .or_else(|| self.config.log_dir.clone())
            .ok_or_else(|| Error::Config("No directory to watch; set log_dir".to_string()))?;

        WatchService::start(
            WatchConfig {
                dir,
                poll_interval: Duration::from_millis(self.config.poll_interval_ms),
                editor: self.config.editor.clone(),
            },
            Arc::clone(&self.registry),
            Arc::clone(&self.gate),
        )
    }

    pub fn maintain<F>(&self, on_progress: F) -> Result<usize>
    where
        F: FnMut(MaintenanceProgress),
    {
        maintain(&self.registry, &self.gate, on_progress)
    }

    pub fn title_view(&self, title: Title) -> TitleView<'_> {
        TitleView::new(&self.registry, title)
    }

    /// Close every open store.
    pub fn shutdown(&self) -> Result<()> {
        self.registry.close_all()
    }
}
