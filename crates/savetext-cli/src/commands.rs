use super::args::{Cli, Commands, ConfigCommand};
use super::handlers;
use crate::output::Printer;
use anyhow::{Context, Result};
use savetext_runtime::{SaveTextManager, resolve_data_dir};
use savetext_types::Title;

pub fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let printer = Printer::new(cli.format);

    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Show => handlers::config::show(&data_dir, &printer),
            ConfigCommand::SetEditor { editor } => {
                handlers::config::set_editor(&data_dir, editor, &printer)
            }
            ConfigCommand::SetLogDir { dir } => {
                handlers::config::set_log_dir(&data_dir, dir, &printer)
            }
        };
    }

    let manager = SaveTextManager::open(&data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;

    let result = match cli.command {
        Commands::Load { files } => handlers::load::handle(&manager, files, &printer),
        Commands::Watch { dir } => handlers::watch::handle(&manager, dir, &printer),
        Commands::Files { title } => handlers::read::files(&manager, parse_title(&title)?, &printer),
        Commands::Saves { title, file } => {
            handlers::read::saves(&manager, parse_title(&title)?, &file, &printer)
        }
        Commands::Show { title, at } => {
            handlers::read::show(&manager, parse_title(&title)?, &at, &printer)
        }
        Commands::Maintain => handlers::maintain::handle(&manager, &printer),
        Commands::Titles => handlers::titles::handle(&manager, &printer),
        Commands::Config { .. } => Ok(()),
    };

    let closed = manager.shutdown();
    result?;
    closed?;
    Ok(())
}

fn parse_title(input: &str) -> Result<Title> {
    input.parse::<Title>().with_context(|| {
        let known: Vec<_> = Title::ALL.iter().map(|t| t.db_name()).collect();
        format!("Invalid --title '{}' (known: {})", input, known.join(", "))
    })
}
