use chrono::{DateTime, Utc};
use savetext_types::Title;

use crate::registry::{StoreRegistry, lock};
use crate::{Error, Result};

/// Read-only view of one title's saves. Never creates a store: a title
/// without one reads as empty.
#[derive(Clone, Copy)]
pub struct TitleView<'a> {
    registry: &'a StoreRegistry,
    title: Title,
}

impl<'a> TitleView<'a> {
    pub fn new(registry: &'a StoreRegistry, title: Title) -> Self {
        Self { registry, title }
    }

    pub fn title(&self) -> Title {
        self.title
    }

    pub fn has_store(&self) -> bool {
        self.registry.is_cached(self.title) || self.registry.has_artifact(self.title)
    }

    /// Known log files, most recent first.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let Some(store) = self.registry.get_for_read(self.title)? else {
            return Ok(Vec::new());
        };
        lock(&store).list_files().map_err(Error::index(self.title))
    }

    /// Save timestamps recorded from `file_name`, most recent first.
    pub fn list_timestamps(&self, file_name: &str) -> Result<Vec<DateTime<Utc>>> {
        let Some(store) = self.registry.get_for_read(self.title)? else {
            return Ok(Vec::new());
        };
        lock(&store)
            .list_timestamps(file_name)
            .map_err(Error::index(self.title))
    }

    pub fn read_text(&self, log_at: DateTime<Utc>) -> Result<Option<String>> {
        let Some(store) = self.registry.get_for_read(self.title)? else {
            return Ok(None);
        };
        lock(&store)
            .read_save_text(log_at)
            .map_err(Error::index(self.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savetext_types::from_unix_seconds;
    use tempfile::TempDir;

    #[test]
    fn test_missing_store_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path());
        let view = TitleView::new(&registry, Title::MagicalCursedLand);

        assert!(!view.has_store());
        assert!(view.list_files().unwrap().is_empty());
        assert!(view.list_timestamps("log.txt").unwrap().is_empty());
        assert_eq!(
            view.read_text(from_unix_seconds(1050).unwrap()).unwrap(),
            None
        );
        assert!(!registry.db_path(Title::MagicalCursedLand).exists());
    }

    #[test]
    fn test_view_reads_written_store() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path());
        let ts = |secs| from_unix_seconds(secs).unwrap();
        {
            let store = registry.get_for_write(Title::BulletTimeAgent).unwrap();
            let db = lock(&store);
            db.upsert_coverage(ts(1000), Some(ts(1050)), "log.txt", "app")
                .unwrap();
            db.upsert_save(ts(1050), "S1", ts(1000), "app").unwrap();
        }

        let view = TitleView::new(&registry, Title::BulletTimeAgent);
        assert!(view.has_store());
        assert_eq!(view.list_files().unwrap(), vec!["log.txt"]);
        assert_eq!(view.list_timestamps("log.txt").unwrap(), vec![ts(1050)]);
        assert_eq!(view.read_text(ts(1050)).unwrap().as_deref(), Some("S1"));
    }
}
