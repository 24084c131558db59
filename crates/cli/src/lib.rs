mod index;
mod schema;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use index::IndexArgs;

#[derive(Parser)]
#[command(
    name = "lsifkit",
    version,
    about = "Builds LSIF code-intelligence indexes from semantic facts",
    long_about = "lsifkit turns a dump of symbols, types and occurrences produced by a language \
                  front-end into an LSIF graph: documents, ranges, hovers, definitions, references \
                  and monikers, written as JSON lines."
)]
pub struct Cli {
    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for log files (defaults to ~/.lsifkit/logs)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an index from a facts dump
    #[command(
        long_about = "Reads a JSON facts dump, builds the LSIF graph with a pool of workers and \
                      streams it to the output file. Settings come from an optional JSON config \
                      file and are overridden by flags."
    )]
    Index(IndexArgs),
    /// Print the JSON schema of the facts dump format
    Schema,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(lsifkit_core::logging::default_log_dir);
    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = lsifkit_core::logging::init_logging("lsifkit", &log_dir, level, cli.verbose);

    match cli.command {
        Commands::Index(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(index::run(args))
        }
        Commands::Schema => schema::run(),
    }
}
