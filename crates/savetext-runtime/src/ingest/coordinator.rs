use chrono::{DateTime, Utc};
use savetext_types::{FileSpan, LogEvent, SaveEvent, Title, to_unix_seconds};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::registry::{StoreRegistry, lock};
use crate::source::LogEventSource;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Idle,
    Parsing,
    Upserting,
    Reconciling,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The title's store hit a storage failure earlier in this unit of work
    StoreHalted,
    /// `log_at` precedes the start of the open file
    BeforeFileStart,
}

/// What a single event did to the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Opened {
        file_name: String,
    },
    Saved {
        title: Title,
        log_at: DateTime<Utc>,
        rows: usize,
    },
    Skipped {
        title: Title,
        log_at: DateTime<Utc>,
        reason: SkipReason,
    },
    Reconciled {
        file_name: String,
        titles: Vec<Title>,
    },
}

/// Summary of one ingestion unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub saves: usize,
    pub skipped: usize,
    /// Files whose coverage was reconciled, with the titles that widened
    pub reconciled: Vec<(String, Vec<Title>)>,
}

impl IngestReport {
    fn record(&mut self, outcome: EventOutcome) {
        match outcome {
            EventOutcome::Opened { .. } => {}
            EventOutcome::Saved { .. } => self.saves += 1,
            EventOutcome::Skipped { .. } => self.skipped += 1,
            EventOutcome::Reconciled { file_name, titles } => {
                self.reconciled.push((file_name, titles))
            }
        }
    }
}

/// Routes parser events to title stores.
///
/// Each save is written as upsert-save then upsert-coverage inside one store
/// transaction. When a file's final span is known, every store in the
/// registry that already knows the file has its coverage widened to it.
///
/// Stores that fail with a storage error are halted for the lifetime of the
/// coordinator; their later saves are skipped while other titles continue.
pub struct IngestCoordinator<'a> {
    registry: &'a StoreRegistry,
    editor: String,
    unit: String,
    state: IngestState,
    current: Option<FileSpan>,
    halted: BTreeMap<Title, String>,
    changed: BTreeSet<Title>,
}

impl<'a> IngestCoordinator<'a> {
    pub fn new(registry: &'a StoreRegistry, editor: impl Into<String>) -> Self {
        Self {
            registry,
            editor: editor.into(),
            unit: String::new(),
            state: IngestState::Idle,
            current: None,
            halted: BTreeMap::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Span of the open file as known so far.
    pub fn current_span(&self) -> Option<&FileSpan> {
        self.current.as_ref()
    }

    /// Halted titles with the error that halted them.
    pub fn halted(&self) -> &BTreeMap<Title, String> {
        &self.halted
    }

    /// Titles whose stores changed since the last call.
    pub fn take_changed(&mut self) -> BTreeSet<Title> {
        std::mem::take(&mut self.changed)
    }

    /// Drain `source` as one ingestion unit.
    ///
    /// Any error aborts the rest of the unit; rows already committed stay.
    /// A source that ends with a file still open is reconciled with the
    /// last known span.
    pub fn run<S>(&mut self, source: &mut S) -> Result<IngestReport>
    where
        S: LogEventSource + ?Sized,
    {
        let mut report = IngestReport {
            source: source.name().to_string(),
            ..Default::default()
        };

        self.unit = report.source.clone();
        self.current = None;
        self.state = IngestState::Parsing;

        let result = self.drain(source, &mut report);
        match result {
            Ok(()) => {
                self.state = IngestState::Completed;
                tracing::info!(
                    file = %report.source,
                    saves = report.saves,
                    skipped = report.skipped,
                    "ingestion unit completed"
                );
                Ok(report)
            }
            Err(err) => {
                self.current = None;
                self.state = IngestState::Failed;
                tracing::error!(file = %report.source, error = %err, "ingestion unit failed");
                Err(err)
            }
        }
    }

    fn drain<S>(&mut self, source: &mut S, report: &mut IngestReport) -> Result<()>
    where
        S: LogEventSource + ?Sized,
    {
        while let Some(event) = source.next_event()? {
            report.record(self.handle(event)?);
        }

        if let Some(span) = self.current.take() {
            tracing::debug!(file = %span.file_name(), "source ended without file close");
            report.record(self.reconcile(&span)?);
        }
        Ok(())
    }

    /// Apply one event.
    pub fn handle(&mut self, event: LogEvent) -> Result<EventOutcome> {
        match event {
            LogEvent::FileOpened { file } => self.open_file(file),
            LogEvent::Saved(save) => self.save(save),
            LogEvent::FileClosed { file } => self.close_file(file),
        }
    }

    /// Close whatever file is open, reconciling its last known span.
    pub fn finish(&mut self) -> Result<Option<EventOutcome>> {
        match self.current.take() {
            Some(span) => self.reconcile(&span).map(Some),
            None => Ok(None),
        }
    }

    fn open_file(&mut self, file: FileSpan) -> Result<EventOutcome> {
        let file_name = file.file_name();

        match self.current.take() {
            Some(mut span) if span.file_name() == file_name => {
                span.widen(&file);
                self.current = Some(span);
            }
            Some(previous) => {
                // A new file implies the previous one ended
                self.reconcile(&previous)?;
                self.current = Some(file);
            }
            None => self.current = Some(file),
        }

        self.state = IngestState::Parsing;
        tracing::debug!(file = %file_name, "file opened");
        Ok(EventOutcome::Opened { file_name })
    }

    fn save(&mut self, save: SaveEvent) -> Result<EventOutcome> {
        let title = save.title;
        let Some(span) = self.current.as_mut() else {
            return Err(Error::event_source(
                &self.unit,
                format!("save for {} at {} without an open file", title, save.log_at),
            ));
        };

        if self.halted.contains_key(&title) {
            tracing::debug!(title = %title, log_at = %save.log_at, "store halted, save skipped");
            return Ok(EventOutcome::Skipped {
                title,
                log_at: save.log_at,
                reason: SkipReason::StoreHalted,
            });
        }

        // Stores keep whole seconds
        if to_unix_seconds(&save.log_at) < to_unix_seconds(&span.log_from) {
            tracing::warn!(
                title = %title,
                file = %span.file_name(),
                log_at = %save.log_at,
                log_from = %span.log_from,
                "save precedes file start, skipped"
            );
            return Ok(EventOutcome::Skipped {
                title,
                log_at: save.log_at,
                reason: SkipReason::BeforeFileStart,
            });
        }

        span.extend_to(save.log_at);
        let span = span.clone();

        self.state = IngestState::Upserting;
        let result = self.write_save(&save, &span);
        self.state = IngestState::Parsing;

        match result {
            Ok(rows) => {
                if rows > 0 {
                    self.changed.insert(title);
                }
                tracing::debug!(
                    title = %title,
                    file = %span.file_name(),
                    log_at = %save.log_at,
                    "save stored"
                );
                Ok(EventOutcome::Saved {
                    title,
                    log_at: save.log_at,
                    rows,
                })
            }
            Err(err) => {
                tracing::error!(
                    title = %title,
                    file = %span.file_name(),
                    log_at = %save.log_at,
                    error = %err,
                    "failed to store save"
                );
                self.halt_on_storage_error(title, &err);
                Err(err)
            }
        }
    }

    fn write_save(&self, save: &SaveEvent, span: &FileSpan) -> Result<usize> {
        let title = save.title;
        let store = self.registry.get_for_write(title)?;
        let mut db = lock(&store);

        let tx = db.transaction().map_err(Error::index(title))?;
        let rows = tx
            .upsert_save(save.log_at, &save.text, span.log_from, &self.editor)
            .map_err(Error::index(title))?;
        if rows > 0 {
            tx.upsert_coverage(span.log_from, span.log_until, &span.file_name(), &self.editor)
                .map_err(Error::index(title))?;
        }
        tx.commit().map_err(Error::index(title))?;

        Ok(rows)
    }

    fn close_file(&mut self, file: FileSpan) -> Result<EventOutcome> {
        let span = match self.current.take() {
            Some(mut span) if span.file_name() == file.file_name() => {
                span.widen(&file);
                span
            }
            Some(other) => {
                tracing::warn!(
                    open = %other.file_name(),
                    closed = %file.file_name(),
                    "close for a file that is not open"
                );
                self.reconcile(&other)?;
                file
            }
            None => file,
        };

        self.reconcile(&span)
    }

    /// Widen the coverage of `span`'s file in every cached store that
    /// already knows it. All stores are attempted; the first error wins.
    fn reconcile(&mut self, span: &FileSpan) -> Result<EventOutcome> {
        self.state = IngestState::Reconciling;
        let file_name = span.file_name();

        let mut widened = Vec::new();
        let mut first_err = None;

        for (title, store) in self.registry.get_all() {
            if self.halted.contains_key(&title) {
                continue;
            }

            let result = lock(&store)
                .update_coverage_only(span.log_from, span.log_until, &file_name, &self.editor)
                .map_err(Error::index(title));

            match result {
                Ok(0) => {}
                Ok(_) => {
                    widened.push(title);
                    self.changed.insert(title);
                }
                Err(err) => {
                    tracing::error!(
                        title = %title,
                        file = %file_name,
                        error = %err,
                        "coverage reconciliation failed"
                    );
                    self.halt_on_storage_error(title, &err);
                    first_err.get_or_insert(err);
                }
            }
        }

        self.state = IngestState::Parsing;
        if let Some(err) = first_err {
            return Err(err);
        }

        tracing::debug!(file = %file_name, widened = widened.len(), "file coverage reconciled");
        Ok(EventOutcome::Reconciled {
            file_name,
            titles: widened,
        })
    }

    fn halt_on_storage_error(&mut self, title: Title, err: &Error) {
        if err.is_storage_io() && !self.halted.contains_key(&title) {
            tracing::warn!(title = %title, error = %err, "halting store after storage failure");
            self.halted.insert(title, err.to_string());
        }
    }
}
