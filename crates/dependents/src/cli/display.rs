//! Output helpers shared by CLI commands.

use std::path::{Path, PathBuf};

use colored::Colorize;
use dependents::{BuildStats, Strategy};

/// Errors listed before the summary switches to a count.
const MAX_LISTED_ERRORS: usize = 5;

/// Print one path per line, relative to `root` where possible.
pub fn print_paths(paths: &[PathBuf], root: &Path) {
    for path in paths {
        println!("{}", relative(path, root).display());
    }
}

/// Print a titled section of paths with a count, for human readers.
pub fn print_section(title: &str, paths: &[PathBuf], root: &Path, empty_message: &str) {
    println!(
        "{} ({} files):",
        title.white().bold(),
        paths.len().to_string().green()
    );
    if paths.is_empty() {
        println!("  {}", empty_message.dimmed());
        return;
    }
    for path in paths {
        println!("  {} {}", "•".dimmed(), relative(path, root).display());
    }
}

/// Summarize skipped files on stderr; silent when the build was clean.
pub fn print_build_warnings(stats: &BuildStats) {
    if stats.errors.is_empty() {
        return;
    }

    eprintln!(
        "{}: {} file(s) could not be indexed and were skipped",
        "warning".yellow().bold(),
        stats.errors.len()
    );
    for error in stats.errors.iter().take(MAX_LISTED_ERRORS) {
        eprintln!("  {} {error}", "•".dimmed());
    }
    if stats.errors.len() > MAX_LISTED_ERRORS {
        eprintln!(
            "  {} ... and {} more",
            "•".dimmed(),
            stats.errors.len() - MAX_LISTED_ERRORS
        );
    }
}

/// One-line description of how the index was built, for verbose runs.
pub fn describe_build(stats: &BuildStats) -> String {
    let strategy = match stats.strategy {
        Strategy::Sequential => "sequential".to_string(),
        Strategy::Parallel { workers } => {
            format!("{workers} workers, {} chunks", stats.chunks_dispatched)
        }
    };
    format!(
        "indexed {} files ({} edges) in {:.2?}, {strategy}",
        stats.files_processed, stats.edges_recorded, stats.duration
    )
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
