use crate::output::Printer;
use anyhow::Result;
use savetext_runtime::SaveTextManager;
use savetext_types::Title;
use serde::Serialize;

#[derive(Serialize)]
struct TitleRow {
    title: Title,
    name: &'static str,
    has_store: bool,
    files: usize,
}

pub fn handle(manager: &SaveTextManager, printer: &Printer) -> Result<()> {
    let mut rows = Vec::new();
    for title in Title::ALL {
        let view = manager.title_view(title);
        let has_store = view.has_store();
        let files = if has_store { view.list_files()?.len() } else { 0 };
        rows.push(TitleRow {
            title,
            name: title.display_name(),
            has_store,
            files,
        });
    }

    if printer.is_json() {
        return printer.json(&rows);
    }

    let width = rows.iter().map(|row| row.title.db_name().len()).max().unwrap_or(0);
    for row in rows {
        let status = if row.has_store {
            printer.success(&format!("{} file(s)", row.files))
        } else {
            printer.dim("no store")
        };
        println!(
            "{:<width$}  {}  {}",
            row.title.db_name(),
            row.name,
            status,
            width = width
        );
    }
    Ok(())
}
