use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// FES Acatlán schedule catalog builder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = default_tracing_format(), global = true)]
    pub tracing: TracingFormat,

    /// Configuration file (defaults to `horarios.toml` if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Retrieve every configured program and write the consolidated dataset
    Scrape {
        /// Only retrieve these program codes (repeatable)
        #[arg(long = "program", value_name = "CODE")]
        programs: Vec<String>,

        /// Override the configured output path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse a saved report page and print the program catalog as JSON
    Parse {
        /// Path to the saved report HTML
        file: PathBuf,

        /// Program code the report belongs to
        #[arg(long)]
        program: String,

        /// Program name (looked up in the configured catalog when omitted)
        #[arg(long)]
        name: Option<String>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Self::Scrape {
            programs: Vec::new(),
            output: None,
        }
    }
}

/// Log formatter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human-readable output for terminals
    Pretty,
    /// One JSON object per event
    Json,
}

fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}
