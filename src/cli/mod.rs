//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lectern",
    version,
    about = "Ask questions answered strictly from your own documents",
    long_about = "Lectern indexes a directory of documents into a local vector index and answers \
                  questions strictly from that material through a local LLM. Questions the corpus \
                  cannot support are refused rather than guessed."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/lectern/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build index artifacts from the document corpus
    Index {
        /// Corpus directory (defaults to the configured documents dir)
        #[arg(short = 'd', long, value_name = "DIR")]
        corpus: Option<PathBuf>,
    },

    /// Ask a question answered only from the indexed corpus
    Ask {
        /// Question to ask
        question: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Also print retrieval candidates with their distances
        #[arg(long)]
        show_matches: bool,
    },

    /// Show index and configuration status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
