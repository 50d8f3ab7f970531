use crate::output::Printer;
use anyhow::Result;
use savetext_runtime::{BatchProgress, CancelToken, SaveTextManager};
use std::path::PathBuf;

pub fn handle(manager: &SaveTextManager, files: Vec<PathBuf>, printer: &Printer) -> Result<()> {
    let files = if files.is_empty() {
        manager.discover()?
    } else {
        files
    };

    if files.is_empty() {
        if printer.is_json() {
            printer.json(&serde_json::json!({ "total": 0 }))?;
        } else {
            println!("No event streams to load.");
        }
        return Ok(());
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let mut render_error = None;
    let result = manager.load_files(&files, cancel, |progress| {
        if let Err(err) = render(&progress, printer) {
            render_error.get_or_insert(err);
        }
    });

    if let Some(err) = render_error {
        return Err(err);
    }
    result?;
    Ok(())
}

fn render(progress: &BatchProgress, printer: &Printer) -> Result<()> {
    if printer.is_json() {
        if let BatchProgress::Completed(report) = progress {
            printer.json(report)?;
        }
        return Ok(());
    }

    match progress {
        BatchProgress::FileStarted {
            index,
            total,
            file_name,
        } => {
            println!("{} {}", printer.dim(&format!("[{}/{}]", index, total)), file_name);
        }
        BatchProgress::FileCompleted { saves, skipped, .. } => {
            let mut line = format!("  {} save(s)", saves);
            if *skipped > 0 {
                line.push_str(&format!(", {} skipped", skipped));
            }
            println!("{}", printer.success(&line));
        }
        BatchProgress::FileFailed { error, .. } => {
            println!("  {}", printer.failure(&format!("failed: {}", error)));
        }
        BatchProgress::StoreHalted { title, error } => {
            println!(
                "  {}",
                printer.warning(&format!("{} halted for this batch: {}", title, error))
            );
        }
        BatchProgress::Cancelled { completed } => {
            println!(
                "{}",
                printer.warning(&format!("Cancelled after {} file(s)", completed))
            );
        }
        BatchProgress::Refresh { titles } => {
            if !titles.is_empty() {
                let names: Vec<_> = titles.iter().map(|t| t.display_name()).collect();
                println!("Updated: {}", names.join(", "));
            }
        }
        BatchProgress::Completed(report) => {
            println!(
                "{}",
                printer.heading(&format!(
                    "Loaded {} of {} file(s), {} save(s)",
                    report.succeeded, report.total, report.saves
                ))
            );
        }
    }
    Ok(())
}
