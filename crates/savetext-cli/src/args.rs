use crate::types::{LogLevel, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "savetext")]
#[command(about = "Collect in-game save texts from game client logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Store directory (default: $SAVETEXT_DATA_DIR, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest event streams in order (default: every stream in log_dir)
    Load {
        files: Vec<PathBuf>,
    },

    /// Follow a directory of event streams until interrupted
    Watch {
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List log files known to a title, most recent first
    Files {
        #[arg(long)]
        title: String,
    },

    /// List save timestamps recorded from a log file
    Saves {
        #[arg(long)]
        title: String,

        #[arg(long)]
        file: String,
    },

    /// Print the save text recorded at a timestamp
    Show {
        #[arg(long)]
        title: String,

        /// RFC 3339, "YYYY-MM-DD HH:MM:SS" (UTC) or unix seconds
        #[arg(long)]
        at: String,
    },

    /// Vacuum and analyze every existing store
    Maintain,

    /// List supported titles and whether each has a store
    Titles,

    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,

    /// Name recorded as created_by / updated_by
    SetEditor {
        editor: String,
    },

    /// Directory of event streams used by load and watch
    SetLogDir {
        dir: PathBuf,
    },
}
