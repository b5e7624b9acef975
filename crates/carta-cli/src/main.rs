//! carta CLI — code-intelligence graph extraction and hybrid retrieval.
//!
//! This binary provides the `carta` command with subcommands for
//! initialization, indexing, search, structural queries, and statistics.
//! See `carta --help` for usage.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod commands;

use cli_args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if cli.verbose { "carta=debug" } else { "carta=warn" })
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Init => commands::init(cli.verbose),
        Commands::Index { path } => commands::index(&path, cli.json, cli.verbose),
        Commands::Search {
            query,
            limit,
            mode,
            offline,
        } => commands::search(&query, limit, mode, offline, cli.json),
        Commands::Query { statement } => commands::run_query(&statement, cli.json),
        Commands::Stats => commands::stats(cli.json),
    };
    std::process::exit(exit_code);
}
