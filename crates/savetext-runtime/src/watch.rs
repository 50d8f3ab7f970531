use chrono::{DateTime, Utc};
use notify::{Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use savetext_types::{LogEvent, Title, file_name_of};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::gate::IngestGate;
use crate::ingest::{EventOutcome, IngestCoordinator};
use crate::registry::StoreRegistry;
use crate::source::{discover_event_files, is_event_file};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub dir: PathBuf,
    pub poll_interval: Duration,
    pub editor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Attached {
        path: PathBuf,
    },
    Ingested {
        title: Title,
        log_at: DateTime<Utc>,
        file_name: String,
    },
    /// Stores changed by one processed chunk
    Refresh {
        titles: Vec<Title>,
    },
    FileClosed {
        file_name: String,
    },
    Error(String),
}

/// Tails a directory of event streams and ingests appended events.
///
/// The newest stream present at start is read from its beginning; streams
/// created or appended to afterwards are picked up as the poller sees them.
/// Dropping the service stops the worker and reconciles any open file.
pub struct WatchService {
    watcher: Option<PollWatcher>,
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<WatchEvent>,
}

impl WatchService {
    pub fn start(
        config: WatchConfig,
        registry: Arc<StoreRegistry>,
        gate: Arc<IngestGate>,
    ) -> Result<Self> {
        let initial = discover_event_files(&config.dir)?;

        let (tx_out, rx_out) = channel();
        let (tx_fs, rx_fs) = channel();

        let notify_config = notify::Config::default().with_poll_interval(config.poll_interval);
        let mut watcher = PollWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    let _ = tx_fs.send(event);
                }
            },
            notify_config,
        )?;
        watcher.watch(&config.dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = %config.dir.display(), "watching event streams");

        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("savetext-watch-worker".to_string())
            .spawn(move || {
                let mut worker = Worker::new(&registry, &gate, &config.editor, tx_out);
                if let Some(newest) = initial.last() {
                    worker.ingest(newest);
                }
                worker.run(&rx_fs, &worker_stop, config.poll_interval);
                worker.shutdown();
            })
            .map_err(Error::Io)?;

        Ok(Self {
            watcher: Some(watcher),
            handle: Some(handle),
            stop,
            rx: rx_out,
        })
    }

    pub fn receiver(&self) -> &Receiver<WatchEvent> {
        &self.rx
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.watcher.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("watch worker panicked");
        }
    }
}

struct Tail<'a> {
    offset: u64,
    coordinator: IngestCoordinator<'a>,
}

struct Worker<'a> {
    registry: &'a StoreRegistry,
    gate: &'a IngestGate,
    editor: &'a str,
    tails: HashMap<PathBuf, Tail<'a>>,
    tx: Sender<WatchEvent>,
}

impl<'a> Worker<'a> {
    fn new(
        registry: &'a StoreRegistry,
        gate: &'a IngestGate,
        editor: &'a str,
        tx: Sender<WatchEvent>,
    ) -> Self {
        Self {
            registry,
            gate,
            editor,
            tails: HashMap::new(),
            tx,
        }
    }

    fn run(&mut self, rx_fs: &Receiver<Event>, stop: &AtomicBool, poll_interval: Duration) {
        while !stop.load(Ordering::SeqCst) {
            match rx_fs.recv_timeout(poll_interval) {
                Ok(event) => self.handle_fs_event(&event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn handle_fs_event(&mut self, event: &Event) {
        let relevant = event.paths.iter().filter(|path| is_event_file(path));
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in relevant {
                    self.ingest(path);
                }
            }
            EventKind::Remove(_) => {
                let removed: Vec<PathBuf> = relevant.cloned().collect();
                for path in removed {
                    self.detach(&path);
                }
            }
            _ => {}
        }
    }

    /// Read complete lines appended to `path` since the last visit.
    fn ingest(&mut self, path: &Path) {
        if !self.tails.contains_key(path) {
            self.tails.insert(
                path.to_path_buf(),
                Tail {
                    offset: 0,
                    coordinator: IngestCoordinator::new(self.registry, self.editor),
                },
            );
            tracing::info!(path = %path.display(), "attached to event stream");
            self.send(WatchEvent::Attached {
                path: path.to_path_buf(),
            });
        }

        let chunk = match self.read_appended(path) {
            Ok(chunk) => chunk,
            Err(err) => {
                self.send(WatchEvent::Error(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    err
                )));
                return;
            }
        };
        if chunk.is_empty() {
            return;
        }

        let file_name = file_name_of(path);
        let mut outgoing = Vec::new();
        {
            let _guard = self.gate.begin();
            let Some(tail) = self.tails.get_mut(path) else {
                return;
            };

            for (line_no, line) in chunk.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let event = match LogEvent::from_json_line(line) {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(file = %file_name, error = %err, "malformed event line");
                        outgoing.push(WatchEvent::Error(format!(
                            "{}: chunk line {}: {}",
                            file_name,
                            line_no + 1,
                            err
                        )));
                        continue;
                    }
                };

                let closing = matches!(event, LogEvent::FileClosed { .. });
                match tail.coordinator.handle(event) {
                    Ok(EventOutcome::Saved { title, log_at, .. }) => {
                        outgoing.push(WatchEvent::Ingested {
                            title,
                            log_at,
                            file_name: file_name.clone(),
                        });
                    }
                    Ok(EventOutcome::Reconciled { file_name, .. }) if closing => {
                        outgoing.push(WatchEvent::FileClosed { file_name });
                    }
                    Ok(_) => {}
                    Err(err) => outgoing.push(WatchEvent::Error(err.to_string())),
                }
            }

            let titles: Vec<Title> = tail.coordinator.take_changed().into_iter().collect();
            if !titles.is_empty() {
                outgoing.push(WatchEvent::Refresh { titles });
            }
        }

        for event in outgoing {
            self.send(event);
        }
    }

    fn read_appended(&mut self, path: &Path) -> std::io::Result<String> {
        let Some(tail) = self.tails.get_mut(path) else {
            return Ok(String::new());
        };

        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < tail.offset {
            tracing::warn!(path = %path.display(), "event stream truncated, rereading");
            tail.offset = 0;
        }

        file.seek(SeekFrom::Start(tail.offset))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        // Only complete lines; a partial last line waits for the next poll
        let Some(end) = bytes.iter().rposition(|b| *b == b'\n') else {
            return Ok(String::new());
        };
        bytes.truncate(end + 1);
        tail.offset += bytes.len() as u64;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn detach(&mut self, path: &Path) {
        if let Some(mut tail) = self.tails.remove(path) {
            tracing::info!(path = %path.display(), "event stream removed");
            let _guard = self.gate.begin();
            if let Err(err) = tail.coordinator.finish() {
                self.send(WatchEvent::Error(err.to_string()));
            }
        }
    }

    fn shutdown(&mut self) {
        let paths: Vec<PathBuf> = self.tails.keys().cloned().collect();
        for path in paths {
            self.detach(&path);
        }
    }

    fn send(&self, event: WatchEvent) {
        let _ = self.tx.send(event);
    }
}
