use crate::output::Printer;
use anyhow::Result;
use savetext_runtime::Config;
use std::path::Path;

pub fn show(data_dir: &Path, printer: &Printer) -> Result<()> {
    let config_path = Config::path_in(data_dir);
    let config = Config::load_from(&config_path)?;

    if printer.is_json() {
        return printer.json(&serde_json::json!({
            "data_dir": data_dir,
            "config_path": config_path,
            "config": config,
        }));
    }

    println!("{}", printer.heading("Configuration"));
    println!("  data_dir:         {}", data_dir.display());
    println!("  config_path:      {}", config_path.display());
    println!("  editor:           {}", config.editor);
    println!(
        "  log_dir:          {}",
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| printer.dim("(not set)"))
    );
    println!("  poll_interval_ms: {}", config.poll_interval_ms);
    Ok(())
}

pub fn set_editor(data_dir: &Path, editor: &str, printer: &Printer) -> Result<()> {
    update(data_dir, printer, |config| config.editor = editor.to_string())
}

pub fn set_log_dir(data_dir: &Path, dir: &Path, printer: &Printer) -> Result<()> {
    let dir = if dir.is_relative() {
        std::env::current_dir()?.join(dir)
    } else {
        dir.to_path_buf()
    };
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "log directory does not exist yet");
    }
    update(data_dir, printer, |config| config.log_dir = Some(dir))
}

fn update<F>(data_dir: &Path, printer: &Printer, apply: F) -> Result<()>
where
    F: FnOnce(&mut Config),
{
    let config_path = Config::path_in(data_dir);
    let mut config = Config::load_from(&config_path)?;
    apply(&mut config);
    config.save_to(&config_path)?;

    if printer.is_json() {
        return printer.json(&config);
    }
    println!("Saved {}", config_path.display());
    Ok(())
}
