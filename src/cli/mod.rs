//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rankfuse",
    version,
    about = "Hybrid passage retrieval: BM25 + vector search, rank fusion, cross-encoder reranking",
    long_about = "Rankfuse builds and queries the lexical half of a hybrid document-QA retrieval \
                  pipeline. `index` ingests passages and persists a BM25 index artifact; `search` \
                  runs lexical queries against it. Vector search and reranking are wired in by the \
                  embedding application through the library API."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/rankfuse/config.toml)
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
    /// Build and persist a lexical index from a JSONL passage file
    Index {
        /// Input file: one JSON object per line with text, source, optional page
        input: PathBuf,

        /// Artifact location (defaults to storage.index_path from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Query a persisted lexical index
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Artifact location (defaults to storage.index_path from config)
        #[arg(long)]
        index: Option<PathBuf>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
