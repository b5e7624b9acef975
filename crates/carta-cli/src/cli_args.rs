//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "carta",
    version,
    about = "Code-intelligence graph extraction and hybrid retrieval"
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose progress on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create `.carta/` with a default configuration.
    Init,

    /// Ingest a repository and persist the graph snapshot.
    Index {
        /// Repository root.
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Search the indexed repository.
    Search {
        query: String,

        #[arg(short = 'k', long, default_value_t = 10)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = SearchMode::Hybrid)]
        mode: SearchMode,

        /// Skip the embedding model; vector search uses the hashing encoder.
        #[arg(long)]
        offline: bool,
    },

    /// Run a structural query against the graph snapshot.
    Query { statement: String },

    /// Print graph statistics from the snapshot.
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchMode {
    Bm25,
    Semantic,
    Hybrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_defaults() {
        let cli = Cli::try_parse_from(["carta", "index"]).unwrap();
        match cli.command {
            Commands::Index { path } => {
                assert_eq!(path, PathBuf::from("."));
            }
            _ => panic!("expected index"),
        }
    }

    #[test]
    fn test_parse_search_mode() {
        let cli = Cli::try_parse_from(["carta", "search", "login", "--mode", "bm25"]).unwrap();
        match cli.command {
            Commands::Search {
                query,
                mode,
                limit,
                offline,
            } => {
                assert_eq!(query, "login");
                assert_eq!(mode, SearchMode::Bm25);
                assert_eq!(limit, 10);
                assert!(!offline);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["carta", "--json", "stats"]).unwrap();
        assert!(cli.json);
    }
}
