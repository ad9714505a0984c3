//! Dependents CLI - find the files that import a given module.
//!
//! Scans a project directory for CommonJS, AMD, ES module, Sass and Stylus
//! imports and prints every file that depends on the one named.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::lookup::LookupArgs;

/// Dependents: list the files that depend on a JS, AMD, Sass or Stylus module.
#[derive(Parser)]
#[command(name = "dependents")]
#[command(version, about, long_about = None)]
struct Cli {
    /// File whose dependents should be listed
    filename: PathBuf,

    /// Root of all files to scan
    #[arg(short, long)]
    directory: PathBuf,

    /// Location of a RequireJS config file for AMD path aliases
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated list of file and directory names to exclude
    #[arg(short, long, value_name = "PATH,...")]
    exclude: Option<String>,

    /// Number of files from which indexing runs on worker threads
    #[arg(long, value_name = "N")]
    threshold: Option<usize>,

    /// Worker threads for parallel indexing (defaults to available cores)
    #[arg(short = 'j', long, value_name = "N")]
    workers: Option<NonZeroUsize>,

    /// Also list files that depend on the target indirectly
    #[arg(short, long)]
    transitive: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = cli::lookup::run(LookupArgs {
        filename: cli.filename,
        directory: cli.directory,
        config: cli.config,
        exclude: cli.exclude,
        threshold: cli.threshold,
        workers: cli.workers,
        transitive: cli.transitive,
        verbose: cli.verbose > 0,
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
