use crate::output::Printer;
use anyhow::{Result, bail};
use savetext_runtime::SaveTextManager;
use savetext_types::{Title, parse_timestamp};

pub fn files(manager: &SaveTextManager, title: Title, printer: &Printer) -> Result<()> {
    let files = manager.title_view(title).list_files()?;

    if printer.is_json() {
        return printer.json(&files);
    }
    if files.is_empty() {
        println!("No log files recorded for {}.", title.display_name());
        return Ok(());
    }
    for file in files {
        println!("{}", file);
    }
    Ok(())
}

pub fn saves(
    manager: &SaveTextManager,
    title: Title,
    file_name: &str,
    printer: &Printer,
) -> Result<()> {
    let timestamps = manager.title_view(title).list_timestamps(file_name)?;

    if printer.is_json() {
        return printer.json(&timestamps);
    }
    if timestamps.is_empty() {
        println!("No saves recorded from {}.", file_name);
        return Ok(());
    }
    for log_at in timestamps {
        println!("{}", log_at.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}

pub fn show(manager: &SaveTextManager, title: Title, at: &str, printer: &Printer) -> Result<()> {
    let Some(log_at) = parse_timestamp(at) else {
        bail!("Invalid timestamp '{}'", at);
    };

    let Some(text) = manager.title_view(title).read_text(log_at)? else {
        bail!(
            "No {} save at {}",
            title.display_name(),
            log_at.format("%Y-%m-%d %H:%M:%S")
        );
    };

    if printer.is_json() {
        return printer.json(&serde_json::json!({
            "title": title,
            "log_at": log_at,
            "text": text,
        }));
    }
    println!("{}", text);
    Ok(())
}
