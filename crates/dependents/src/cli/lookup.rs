//! `dependents <FILENAME>` implementation.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use colored::Colorize;
use dependents::{Dependents, DependentsOptions, Error, Exclusions};

use super::display::{describe_build, print_build_warnings, print_paths, print_section};

/// Arguments for one lookup, already parsed from the command line.
#[derive(Debug)]
pub struct LookupArgs {
    /// File whose dependents are wanted
    pub filename: PathBuf,
    /// Project directory to scan
    pub directory: PathBuf,
    /// Alias config file
    pub config: Option<PathBuf>,
    /// Comma-joined exclusion list
    pub exclude: Option<String>,
    /// Parallel threshold override
    pub threshold: Option<usize>,
    /// Worker count override
    pub workers: Option<NonZeroUsize>,
    /// Also list indirect dependents
    pub transitive: bool,
    /// Print build details on stderr
    pub verbose: bool,
}

/// Run the lookup.
pub fn run(args: LookupArgs) -> Result<(), Error> {
    if args.filename.as_os_str().is_empty() {
        return Err(Error::Config("a filename must be given".to_string()));
    }

    let mut options = DependentsOptions::default();
    if let Some(config) = args.config {
        options = options.with_config(config);
    }
    if let Some(exclude) = args.exclude.as_deref() {
        options = options.with_exclusions(Exclusions::parse(exclude));
    }
    if let Some(threshold) = args.threshold {
        options = options.with_parallel_threshold(threshold);
    }
    if let Some(workers) = args.workers {
        options = options.with_workers(workers);
    }

    let target = target_path(&args.filename);
    let lookup = Dependents::new(&args.directory, options)?;
    let index = lookup.build_for(&target)?;
    let root = index.root();

    if args.verbose {
        eprintln!("{}", describe_build(index.stats()).dimmed());
    }
    print_build_warnings(index.stats());

    let direct = index.dependents_of(&target);

    if args.transitive {
        let all = index.transitive_dependents(&target);
        let indirect: Vec<PathBuf> = all.into_iter().filter(|p| !direct.contains(p)).collect();
        print_section("Direct dependents", &direct, root, "(none)");
        println!();
        print_section("Transitive dependents", &indirect, root, "(none beyond direct)");
    } else {
        print_paths(&direct, root);
    }

    Ok(())
}

/// A filename that exists relative to the working directory is taken from
/// there; anything else is looked up relative to the project directory.
fn target_path(filename: &Path) -> PathBuf {
    if filename.is_relative()
        && filename.is_file()
        && let Ok(absolute) = filename.canonicalize()
    {
        return absolute;
    }
    filename.to_path_buf()
}
