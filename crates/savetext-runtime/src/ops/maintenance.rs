use savetext_types::Title;

use crate::gate::IngestGate;
use crate::registry::{StoreRegistry, lock};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceProgress {
    Vacuum {
        title: Title,
        index: usize,
        total: usize,
    },
    Analyze {
        title: Title,
        index: usize,
        total: usize,
    },
    /// No store exists for the title; nothing is created
    Skipped {
        title: Title,
        index: usize,
        total: usize,
    },
    Failed {
        title: Title,
        error: String,
    },
    Completed {
        maintained: usize,
        skipped: usize,
    },
}

/// VACUUM then ANALYZE every existing title store.
///
/// Refuses to start while an ingestion unit is in flight. A failing store
/// does not stop the others; the first failure is returned at the end.
pub fn maintain<F>(registry: &StoreRegistry, gate: &IngestGate, mut on_progress: F) -> Result<usize>
where
    F: FnMut(MaintenanceProgress),
{
    let _guard = gate.try_begin()?;

    let total = Title::ALL.len();
    let mut maintained = 0;
    let mut skipped = 0;
    let mut first_err = None;

    for (offset, title) in Title::ALL.iter().copied().enumerate() {
        let index = offset + 1;

        let store = match registry.get_for_read(title) {
            Ok(Some(store)) => store,
            Ok(None) => {
                skipped += 1;
                on_progress(MaintenanceProgress::Skipped {
                    title,
                    index,
                    total,
                });
                continue;
            }
            Err(err) => {
                on_progress(MaintenanceProgress::Failed {
                    title,
                    error: err.to_string(),
                });
                first_err.get_or_insert(err);
                continue;
            }
        };

        let db = lock(&store);
        on_progress(MaintenanceProgress::Vacuum {
            title,
            index,
            total,
        });
        let result = db.vacuum().and_then(|()| {
            on_progress(MaintenanceProgress::Analyze {
                title,
                index,
                total,
            });
            db.analyze()
        });

        match result {
            Ok(()) => maintained += 1,
            Err(source) => {
                tracing::error!(title = %title, error = %source, "store maintenance failed");
                on_progress(MaintenanceProgress::Failed {
                    title,
                    error: source.to_string(),
                });
                first_err.get_or_insert(Error::Index { title, source });
            }
        }
    }

    on_progress(MaintenanceProgress::Completed {
        maintained,
        skipped,
    });
    tracing::info!(maintained, skipped, "maintenance finished");

    match first_err {
        Some(err) => Err(err),
        None => Ok(maintained),
    }
}
