use crate::output::Printer;
use anyhow::Result;
use savetext_runtime::{SaveTextManager, WatchEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

pub fn handle(manager: &SaveTextManager, dir: Option<PathBuf>, printer: &Printer) -> Result<()> {
    let service = manager.watch(dir)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))?;

    if !printer.is_json() {
        println!("{}", printer.dim("Watching for saves (Ctrl-C to stop)"));
    }

    while !stop.load(Ordering::SeqCst) {
        match service.receiver().recv_timeout(Duration::from_millis(200)) {
            Ok(event) => render(&event, printer)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Stops the worker and reconciles open files
    drop(service);
    Ok(())
}

fn render(event: &WatchEvent, printer: &Printer) -> Result<()> {
    if printer.is_json() {
        let value = match event {
            WatchEvent::Attached { path } => {
                serde_json::json!({ "event": "attached", "path": path })
            }
            WatchEvent::Ingested {
                title,
                log_at,
                file_name,
            } => serde_json::json!({
                "event": "ingested",
                "title": title,
                "log_at": log_at,
                "file_name": file_name,
            }),
            WatchEvent::Refresh { titles } => {
                serde_json::json!({ "event": "refresh", "titles": titles })
            }
            WatchEvent::FileClosed { file_name } => {
                serde_json::json!({ "event": "file_closed", "file_name": file_name })
            }
            WatchEvent::Error(message) => {
                serde_json::json!({ "event": "error", "message": message })
            }
        };
        return printer.json_line(&value);
    }

    match event {
        WatchEvent::Attached { path } => {
            println!("{} {}", printer.heading("attached"), path.display());
        }
        WatchEvent::Ingested {
            title,
            log_at,
            file_name,
        } => {
            println!(
                "{} {} {}",
                printer.success(&log_at.format("%Y-%m-%d %H:%M:%S").to_string()),
                title.display_name(),
                printer.dim(file_name)
            );
        }
        WatchEvent::Refresh { .. } => {}
        WatchEvent::FileClosed { file_name } => {
            println!("{} {}", printer.dim("closed"), file_name);
        }
        WatchEvent::Error(message) => {
            println!("{}", printer.failure(message));
        }
    }
    Ok(())
}
