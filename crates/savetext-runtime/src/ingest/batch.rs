use savetext_types::{Title, file_name_of};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::coordinator::IngestCoordinator;
use crate::gate::IngestGate;
use crate::registry::StoreRegistry;
use crate::source::{JsonlEventSource, LogEventSource};
use crate::{Error, Result};

/// Request to stop a batch. Checked between files only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub enum BatchProgress {
    FileStarted {
        index: usize,
        total: usize,
        file_name: String,
    },
    FileCompleted {
        index: usize,
        total: usize,
        file_name: String,
        saves: usize,
        skipped: usize,
    },
    FileFailed {
        index: usize,
        total: usize,
        file_name: String,
        error: String,
    },
    StoreHalted {
        title: Title,
        error: String,
    },
    Cancelled {
        completed: usize,
    },
    /// Stores changed by the batch; emitted once per batch
    Refresh {
        titles: Vec<Title>,
    },
    Completed(BatchReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedFile>,
    pub saves: usize,
    pub skipped: usize,
    pub halted: Vec<Title>,
    pub refreshed: Vec<Title>,
    pub cancelled: bool,
}

type Unit = (String, Result<Box<dyn LogEventSource>>);

/// Sequences ingestion units through one coordinator, strictly in order and
/// one at a time, as a single unit of work.
pub struct BatchRunner<'a> {
    registry: &'a StoreRegistry,
    gate: &'a IngestGate,
    editor: String,
    cancel: CancelToken,
}

impl<'a> BatchRunner<'a> {
    pub fn new(registry: &'a StoreRegistry, gate: &'a IngestGate, editor: impl Into<String>) -> Self {
        Self {
            registry,
            gate,
            editor: editor.into(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Ingest JSON Lines event streams in the given order.
    pub fn run<F>(&self, files: &[PathBuf], on_progress: F) -> Result<BatchReport>
    where
        F: FnMut(BatchProgress),
    {
        let units = files.iter().map(|path| -> Unit {
            let source = JsonlEventSource::open(path)
                .map(|source| Box::new(source) as Box<dyn LogEventSource>);
            (file_name_of(path), source)
        });
        self.run_units(files.len(), units, on_progress)
    }

    /// Ingest already constructed sources in the given order.
    pub fn run_with<F>(
        &self,
        sources: Vec<Box<dyn LogEventSource>>,
        on_progress: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(BatchProgress),
    {
        let total = sources.len();
        let units = sources
            .into_iter()
            .map(|source| -> Unit { (source.name().to_string(), Ok(source)) });
        self.run_units(total, units, on_progress)
    }

    fn run_units<I, F>(&self, total: usize, units: I, mut on_progress: F) -> Result<BatchReport>
    where
        I: Iterator<Item = Unit>,
        F: FnMut(BatchProgress),
    {
        let _guard = self.gate.try_begin()?;

        let mut coordinator = IngestCoordinator::new(self.registry, self.editor.as_str());
        let mut report = BatchReport {
            total,
            ..Default::default()
        };
        let mut reported_halts = BTreeSet::new();

        tracing::info!(total, "batch started");

        for (offset, (file_name, source)) in units.enumerate() {
            let index = offset + 1;

            if self.cancel.is_cancelled() {
                tracing::info!(completed = offset, total, "batch cancelled");
                report.cancelled = true;
                on_progress(BatchProgress::Cancelled { completed: offset });
                break;
            }

            on_progress(BatchProgress::FileStarted {
                index,
                total,
                file_name: file_name.clone(),
            });

            match source.and_then(|mut source| coordinator.run(source.as_mut())) {
                Ok(unit) => {
                    report.succeeded += 1;
                    report.saves += unit.saves;
                    report.skipped += unit.skipped;
                    on_progress(BatchProgress::FileCompleted {
                        index,
                        total,
                        file_name,
                        saves: unit.saves,
                        skipped: unit.skipped,
                    });
                }
                Err(err) => {
                    tracing::error!(file = %file_name, error = %err, "file failed");
                    let error = err.to_string();
                    report.failed.push(FailedFile {
                        file_name: file_name.clone(),
                        error: error.clone(),
                    });
                    on_progress(BatchProgress::FileFailed {
                        index,
                        total,
                        file_name,
                        error,
                    });
                }
            }

            for (title, error) in coordinator.halted() {
                if reported_halts.insert(*title) {
                    report.halted.push(*title);
                    on_progress(BatchProgress::StoreHalted {
                        title: *title,
                        error: error.clone(),
                    });
                }
            }
        }

        report.refreshed = coordinator.take_changed().into_iter().collect();
        on_progress(BatchProgress::Refresh {
            titles: report.refreshed.clone(),
        });
        on_progress(BatchProgress::Completed(report.clone()));

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            saves = report.saves,
            "batch finished"
        );

        if !report.failed.is_empty() {
            return Err(Error::BatchFailed {
                failed: report.failed.len(),
                total,
            });
        }
        if report.cancelled {
            return Err(Error::Cancelled);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryEventSource;
    use chrono::{DateTime, Utc};
    use savetext_types::{FileSpan, LogEvent, SaveEvent, from_unix_seconds};
    use tempfile::TempDir;

    fn ts(secs: i64) -> DateTime<Utc> {
        from_unix_seconds(secs).unwrap()
    }

    fn session(name: &str, title: Title, from: i64, saves: &[i64]) -> Box<dyn LogEventSource> {
        let mut events = vec![LogEvent::FileOpened {
            file: FileSpan::new(format!("{}.txt", name), ts(from)),
        }];
        events.extend(saves.iter().map(|at| {
            LogEvent::Saved(SaveEvent {
                title,
                log_at: ts(*at),
                text: format!("save {}", at),
            })
        }));
        Box::new(MemoryEventSource::new(format!("{}.jsonl", name), events))
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_files_run_in_order_with_single_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path());
        let gate = IngestGate::new();
        let runner = BatchRunner::new(&registry, &gate, "app");

        let mut events = Vec::new();
        let report = runner
            .run_with(
                vec![
                    session("a", Title::IdleCube, 1000, &[1010, 1020]),
                    session("b", Title::IdleHome, 2000, &[2010]),
                ],
                |event| events.push(event),
            )
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.saves, 3);
        assert_eq!(report.refreshed, vec![Title::IdleCube, Title::IdleHome]);

        let started: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                BatchProgress::FileStarted {
                    index, file_name, ..
                } => Some((*index, file_name.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            started,
            vec![(1, "a.jsonl".to_string()), (2, "b.jsonl".to_string())]
        );

        let refreshes = events
            .iter()
            .filter(|event| matches!(event, BatchProgress::Refresh { .. }))
            .count();
        assert_eq!(refreshes, 1);
        assert!(matches!(events.last(), Some(BatchProgress::Completed(_))));
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_failed_file_does_not_stop_batch() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path());
        let gate = IngestGate::new();
        let runner = BatchRunner::new(&registry, &gate, "app");

        let orphan_save = Box::new(MemoryEventSource::new(
            "broken.jsonl",
            vec![LogEvent::Saved(SaveEvent {
                title: Title::IdleCube,
                log_at: ts(1500),
                text: "orphan".to_string(),
            })],
        ));

        let mut events = Vec::new();
        let err = runner
            .run_with(
                vec![
                    orphan_save,
                    session("ok", Title::IdleCube, 1000, &[1010]),
                ],
                |event| events.push(event),
            )
            .unwrap_err();

        assert!(matches!(err, Error::BatchFailed { failed: 1, total: 2 }));
        assert!(events
            .iter()
            .any(|event| matches!(event, BatchProgress::FileFailed { index: 1, .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, BatchProgress::Refresh { titles } if titles == &vec![Title::IdleCube])));

        let store = registry.get_for_read(Title::IdleCube).unwrap().unwrap();
        assert_eq!(crate::registry::lock(&store).count_saves().unwrap(), 1);
    }

    #[test]
    fn test_cancel_stops_between_files() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path());
        let gate = IngestGate::new();
        let cancel = CancelToken::new();
        let runner = BatchRunner::new(&registry, &gate, "app").with_cancel(cancel.clone());

        let mut events = Vec::new();
        let err = runner
            .run_with(
                vec![
                    session("a", Title::IdleCube, 1000, &[1010]),
                    session("b", Title::IdleHome, 2000, &[2010]),
                ],
                |event| {
                    if matches!(event, BatchProgress::FileCompleted { index: 1, .. }) {
                        cancel.cancel();
                    }
                    events.push(event);
                },
            )
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(events
            .iter()
            .any(|event| matches!(event, BatchProgress::Cancelled { completed: 1 })));
        assert!(registry.has_artifact(Title::IdleCube));
        assert!(!registry.has_artifact(Title::IdleHome));
    }

    #[test]
    fn test_busy_gate_refuses_batch() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path());
        let gate = IngestGate::new();
        let _held = gate.try_begin().unwrap();

        let runner = BatchRunner::new(&registry, &gate, "app");
        let err = runner.run_with(Vec::new(), |_| {}).unwrap_err();
        assert!(matches!(err, Error::Busy));
    }

    #[test]
    fn test_missing_file_is_reported_as_failure() {
        let temp_dir = TempDir::new().unwrap();
        let registry = StoreRegistry::new(temp_dir.path().join("stores"));
        let gate = IngestGate::new();
        let runner = BatchRunner::new(&registry, &gate, "app");

        let mut events = Vec::new();
        let err = runner
            .run(&[temp_dir.path().join("missing.jsonl")], |event| {
                events.push(event)
            })
            .unwrap_err();

        assert!(matches!(err, Error::BatchFailed { failed: 1, total: 1 }));
        assert!(events.iter().any(|event| matches!(
            event,
            BatchProgress::FileFailed { file_name, .. } if file_name == "missing.jsonl"
        )));
    }
}
