//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docq",
    version,
    about = "Local document Q&A with grounded, cited answers",
    long_about = "Docq indexes a directory of PDF/Markdown/text files into a flat vector index and \
                  answers questions either grounded in those documents (with citations) or as \
                  general chat, routed by a heuristic cascade."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docq/config.toml)
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
    /// Build or rebuild the index from a source directory
    Index {
        /// Source directory with .pdf/.md/.txt files (defaults to config)
        #[arg(short, long)]
        src: Option<PathBuf>,

        /// Index output directory (defaults to config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Ask a single question against the indexed documents
    Ask {
        /// Question to ask
        query: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long, default_value = "6")]
        top_k: usize,
    },

    /// Run the HTTP server (POST /ask, POST /ingest, GET /health)
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },

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

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
