use savetext_index::{Clock, Database, system_clock};
use savetext_types::Title;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Error, Result};

/// Shared store handle. The mutex is the per-store write lock: at most one
/// thread issues statements against a connection at a time.
pub type StoreRef = Arc<Mutex<Database>>;

/// Lock a store, recovering the handle if a previous holder panicked.
pub fn lock(store: &StoreRef) -> MutexGuard<'_, Database> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Title to open store handle, created on first use and kept until
/// [`StoreRegistry::close_all`].
///
/// Read access never creates a store artifact; write access always yields
/// an initialized one.
pub struct StoreRegistry {
    root: PathBuf,
    clock: Clock,
    handles: Mutex<HashMap<Title, StoreRef>>,
}

impl StoreRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clock: system_clock,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Audit clock handed to every store opened from now on.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self, title: Title) -> PathBuf {
        self.root.join(title.db_file_name())
    }

    /// True when the title's artifact exists and is non-empty.
    pub fn has_artifact(&self, title: Title) -> bool {
        artifact_len(&self.db_path(title)).is_some_and(|len| len > 0)
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<Title, StoreRef>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached handle, or the existing artifact opened and cached.
    /// `None` when the title has no store; nothing is created.
    pub fn get_for_read(&self, title: Title) -> Result<Option<StoreRef>> {
        let mut handles = self.handles();
        if let Some(store) = handles.get(&title) {
            return Ok(Some(Arc::clone(store)));
        }

        if !self.has_artifact(title) {
            return Ok(None);
        }

        let db = Database::open(&self.db_path(title))
            .map_err(Error::index(title))?
            .with_clock(self.clock);
        tracing::debug!(title = %title, "opened store for read");

        let store = Arc::new(Mutex::new(db));
        handles.insert(title, Arc::clone(&store));
        Ok(Some(store))
    }

    /// Cached handle, or the store opened (created and initialized when the
    /// artifact is absent or empty) and cached.
    pub fn get_for_write(&self, title: Title) -> Result<StoreRef> {
        let mut handles = self.handles();
        if let Some(store) = handles.get(&title) {
            return Ok(Arc::clone(store));
        }

        std::fs::create_dir_all(&self.root)?;

        let db_path = self.db_path(title);
        let create_new = match artifact_len(&db_path) {
            Some(0) => {
                std::fs::remove_file(&db_path)?;
                true
            }
            Some(_) => false,
            None => true,
        };

        let mut db = Database::open(&db_path)
            .map_err(Error::index(title))?
            .with_clock(self.clock);

        if create_new {
            if let Err(err) = db.initialize() {
                // A store that failed DDL is discarded, never cached
                let _ = db.close();
                tracing::error!(title = %title, error = %err, "store initialization failed");
                return Err(Error::Index { title, source: err });
            }
            tracing::info!(title = %title, path = %db_path.display(), "created store");
        }

        let store = Arc::new(Mutex::new(db));
        handles.insert(title, Arc::clone(&store));
        Ok(store)
    }

    /// Every cached handle, ordered by title.
    pub fn get_all(&self) -> Vec<(Title, StoreRef)> {
        let mut all: Vec<_> = self
            .handles()
            .iter()
            .map(|(title, store)| (*title, Arc::clone(store)))
            .collect();
        all.sort_by_key(|(title, _)| *title);
        all
    }

    pub fn is_cached(&self, title: Title) -> bool {
        self.handles().contains_key(&title)
    }

    /// Close every cached handle and clear the cache. Must not run while
    /// writes are in flight. Every handle is closed even if one fails; the
    /// first failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let drained: Vec<_> = self.handles().drain().collect();

        let mut first_err = None;
        for (title, store) in drained {
            if let Err(err) = lock(&store).close() {
                tracing::warn!(title = %title, error = %err, "failed to close store");
                first_err.get_or_insert(Error::Index { title, source: err });
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn artifact_len(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}
