use crate::output::Printer;
use anyhow::Result;
use savetext_runtime::{MaintenanceProgress, SaveTextManager};
use savetext_types::Title;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct StoreStatus {
    title: Title,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn handle(manager: &SaveTextManager, printer: &Printer) -> Result<()> {
    let mut statuses: BTreeMap<Title, StoreStatus> = BTreeMap::new();

    let result = manager.maintain(|progress| {
        if printer.is_json() {
            record(&mut statuses, progress);
            return;
        }

        match progress {
            MaintenanceProgress::Vacuum {
                title,
                index,
                total,
            } => println!(
                "{} vacuum {}",
                printer.dim(&format!("[{}/{}]", index, total)),
                title.display_name()
            ),
            MaintenanceProgress::Analyze {
                title,
                index,
                total,
            } => println!(
                "{} analyze {}",
                printer.dim(&format!("[{}/{}]", index, total)),
                title.display_name()
            ),
            MaintenanceProgress::Skipped { .. } => {}
            MaintenanceProgress::Failed { title, error } => println!(
                "{}",
                printer.failure(&format!("{}: {}", title.display_name(), error))
            ),
            MaintenanceProgress::Completed {
                maintained,
                skipped,
            } => println!(
                "{}",
                printer.heading(&format!(
                    "Maintained {} store(s), {} without data",
                    maintained, skipped
                ))
            ),
        }
    });

    if printer.is_json() {
        let statuses: Vec<_> = statuses.into_values().collect();
        printer.json(&statuses)?;
    }
    result?;
    Ok(())
}

fn record(statuses: &mut BTreeMap<Title, StoreStatus>, progress: MaintenanceProgress) {
    let (title, status, error) = match progress {
        MaintenanceProgress::Analyze { title, .. } => (title, "maintained", None),
        MaintenanceProgress::Skipped { title, .. } => (title, "skipped", None),
        MaintenanceProgress::Failed { title, error } => (title, "failed", Some(error)),
        MaintenanceProgress::Vacuum { .. } | MaintenanceProgress::Completed { .. } => return,
    };
    statuses.insert(
        title,
        StoreStatus {
            title,
            status,
            error,
        },
    );
}
