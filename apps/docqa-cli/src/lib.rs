pub mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "docqa", about = "Ask questions about your documents")]
pub struct Cli {
    /// Directory holding docqa.toml and docqa.<env>.toml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    /// Configuration environment (defaults to RUST_ENV, then "dev")
    #[arg(long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index files or directories (pdf, txt, md)
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Answer a single question
    Ask { question: String },
    /// Interactive session; type Exit to leave
    Chat {
        #[arg(long = "ingest")]
        ingest: Vec<PathBuf>,
    },
}
