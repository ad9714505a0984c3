//! # Dependents: reverse dependency lookup for front-end projects
//!
//! Given a file and the project directory it lives in, `dependents` finds
//! every file that imports it. It understands CommonJS `require`, AMD
//! `define`/`require` (including `RequireJS` path aliases), ES module
//! `import`/`export ... from`, and Sass/Stylus `@import` with partial
//! resolution.
//!
//! ## How it works
//!
//! - **Walk** the directory for candidate files, skipping excluded
//!   directories (`node_modules`, `bower_components`, `vendor`, `.git` plus
//!   anything the caller names)
//! - **Extract** import specifiers from each file according to its module
//!   family
//! - **Resolve** each specifier through the alias table, then to a canonical
//!   absolute path
//! - **Invert** the edges into a [`ReverseIndex`] mapping each file to the
//!   files that import it
//!
//! Large projects are indexed on a pool of worker threads (see
//! [`scheduler`]); small ones on the calling thread.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dependents::{DependentsOptions, compute_dependents};
//! use std::path::Path;
//!
//! let options = DependentsOptions::default().with_config("js/config.json");
//! let found = compute_dependents(Path::new("js/c.js"), Path::new("/path/to/project"), &options)?;
//! for path in found {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), dependents::Error>(())
//! ```
//!
//! To answer several queries from one scan, build a [`DependencyIndex`]:
//!
//! ```no_run
//! use dependents::{Dependents, DependentsOptions};
//! use std::path::Path;
//!
//! let index = Dependents::new(Path::new("/path/to/project"), DependentsOptions::default())?.build()?;
//! let direct = index.dependents_of(Path::new("lib/util.js"));
//! let all = index.transitive_dependents(Path::new("lib/util.js"));
//! println!("{} direct, {} total", direct.len(), all.len());
//! # Ok::<(), dependents::Error>(())
//! ```

pub mod alias;
pub mod builder;
pub mod canonical;
pub mod config;
mod error;
pub mod extract;
mod index;
pub mod scheduler;
mod types;
pub mod walk;

pub use config::{AliasTarget, ConfigSource, ModuleAliasConfig};
pub use error::{Error, IndexError, IndexErrorKind, Result};
pub use index::ReverseIndex;
pub use types::{BuildStats, CanonicalPath, ModuleFamily, SourceKind, Strategy};
pub use walk::Exclusions;

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use builder::IndexBuilder;
use scheduler::{DEFAULT_PARALLEL_THRESHOLD, Scheduler, choose_strategy, default_workers};
use walk::{ExclusionSet, walk};

/// Options for a dependents lookup.
#[derive(Debug, Clone)]
pub struct DependentsOptions {
    /// Module alias config, pre-loaded or as a path to read
    pub config: Option<ConfigSource>,
    /// Extra directory names, file names or file globs to skip
    pub exclusions: Exclusions,
    /// File count from which the build runs on worker threads
    pub parallel_threshold: usize,
    /// Worker count for parallel builds; defaults to the available parallelism
    pub workers: Option<NonZeroUsize>,
    /// Index exactly these files instead of walking the directory
    pub files: Option<Vec<PathBuf>>,
}

impl Default for DependentsOptions {
    fn default() -> Self {
        Self {
            config: None,
            exclusions: Exclusions::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            workers: None,
            files: None,
        }
    }
}

impl DependentsOptions {
    /// Use a module alias config.
    #[must_use]
    pub fn with_config(mut self, config: impl Into<ConfigSource>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Skip these entries in addition to the defaults.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: impl Into<Exclusions>) -> Self {
        self.exclusions = exclusions.into();
        self
    }

    /// Go parallel from `threshold` candidate files.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Use `workers` worker threads for parallel builds.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Index exactly `files`; relative entries resolve against the directory.
    #[must_use]
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = Some(files);
        self
    }
}

/// A configured lookup over one project directory.
///
/// Construction validates the directory, reads the alias config and compiles
/// the exclusions; [`build`](Self::build) does the scan.
#[derive(Debug)]
pub struct Dependents {
    root: PathBuf,
    alias_config: Option<Arc<ModuleAliasConfig>>,
    exclusions: ExclusionSet,
    files: Option<Vec<PathBuf>>,
    parallel_threshold: usize,
    workers: NonZeroUsize,
}

impl Dependents {
    /// Prepare a lookup over `directory`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `directory` is empty or an exclusion is invalid
    /// - [`Error::Io`] if `directory` does not exist or the config cannot be read
    /// - [`Error::AliasConfig`] if the config cannot be parsed
    pub fn new(directory: &Path, options: DependentsOptions) -> Result<Self> {
        if directory.as_os_str().is_empty() {
            return Err(Error::Config("directory must be given".to_string()));
        }

        let root = directory.canonicalize().map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("directory not found: {}", directory.display()),
            ))
        })?;

        let alias_config = match &options.config {
            Some(source) => source.resolve()?.map(Arc::new),
            None => None,
        };
        let exclusions = ExclusionSet::new(&options.exclusions)?;

        Ok(Self {
            root,
            alias_config,
            exclusions,
            files: options.files,
            parallel_threshold: options.parallel_threshold,
            workers: options.workers.unwrap_or_else(default_workers),
        })
    }

    /// Scan the project and build its reverse index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Worker`] or [`Error::Accounting`] if a parallel build
    /// fails. Unreadable or malformed files are not errors; they are listed
    /// in [`BuildStats::errors`].
    pub fn build(&self) -> Result<DependencyIndex> {
        self.build_index(None)
    }

    /// Like [`build`](Self::build), tagging the work with the file being
    /// looked up.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_for(&self, target: &Path) -> Result<DependencyIndex> {
        let target = resolve_target(&self.root, target);
        self.build_index(Some(&target))
    }

    fn build_index(&self, target: Option<&CanonicalPath>) -> Result<DependencyIndex> {
        let start = Instant::now();
        let files = self.candidates();
        let builder = IndexBuilder::new(&self.root, self.alias_config.clone());
        let strategy = choose_strategy(files.len(), self.parallel_threshold, self.workers);

        debug!(
            root = %self.root.display(),
            files = files.len(),
            ?strategy,
            "Building reverse index"
        );

        let (index, report, chunks_dispatched) = match strategy {
            Strategy::Sequential => {
                let mut index = ReverseIndex::new();
                let report = builder.process_files(&mut index, &files);
                (index, report, 0)
            }
            Strategy::Parallel { .. } => {
                let build = Scheduler::new(self.workers).run(&builder, target, files)?;
                (build.index, build.summary, build.chunks_dispatched)
            }
        };

        let stats = BuildStats {
            files_processed: report.files_processed,
            edges_recorded: report.edges_recorded,
            strategy,
            chunks_dispatched,
            duration: start.elapsed(),
            errors: report.errors,
        };

        info!(
            files = stats.files_processed,
            edges = stats.edges_recorded,
            keys = index.len(),
            errors = stats.errors.len(),
            duration_ms = stats.duration.as_millis(),
            "Reverse index built"
        );

        Ok(DependencyIndex {
            root: self.root.clone(),
            index,
            stats,
        })
    }

    fn candidates(&self) -> Vec<PathBuf> {
        match &self.files {
            // Existing entries are resolved on disk so they share the root's spelling
            Some(files) => files
                .iter()
                .map(|f| {
                    let joined = self.root.join(f);
                    joined.canonicalize().unwrap_or(joined)
                })
                .collect(),
            None => walk(&self.root, &self.exclusions).collect(),
        }
    }
}

/// A built reverse index for one project, ready for queries.
#[derive(Debug)]
pub struct DependencyIndex {
    root: PathBuf,
    index: ReverseIndex,
    stats: BuildStats,
}

impl DependencyIndex {
    /// Files that directly import `target`, sorted.
    ///
    /// A relative `target` resolves against the project root. A file nothing
    /// imports, or one the scan never saw, has no dependents.
    #[must_use]
    pub fn dependents_of(&self, target: &Path) -> Vec<PathBuf> {
        let target = resolve_target(&self.root, target);
        let mut found: Vec<PathBuf> = self
            .index
            .dependents_of(&target)
            .map(|p| p.as_path().to_path_buf())
            .collect();
        found.sort();
        found
    }

    /// Files that import `target` directly or through other files, sorted.
    ///
    /// Import cycles are followed once; `target` itself is never included.
    #[must_use]
    pub fn transitive_dependents(&self, target: &Path) -> Vec<PathBuf> {
        let target = resolve_target(&self.root, target);
        let mut visited: HashSet<&CanonicalPath> = HashSet::new();
        let mut queue: VecDeque<&CanonicalPath> = self.index.dependents_of(&target).collect();

        while let Some(current) = queue.pop_front() {
            if *current == target || !visited.insert(current) {
                continue;
            }
            queue.extend(self.index.dependents_of(current));
        }

        let mut found: Vec<PathBuf> = visited.into_iter().map(|p| p.as_path().to_path_buf()).collect();
        found.sort();
        found
    }

    /// The underlying reverse index.
    #[must_use]
    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    /// Statistics from the build.
    #[must_use]
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Canonical project root the index was built for.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Find every file in `directory` that directly imports `target`.
///
/// A relative `target` resolves against `directory`. The result is sorted
/// and free of duplicates; a file nothing imports yields an empty list.
///
/// # Errors
///
/// - [`Error::Config`] if `target` or `directory` is empty; no I/O happens
/// - anything [`Dependents::new`] or [`Dependents::build`] returns
pub fn compute_dependents(
    target: &Path,
    directory: &Path,
    options: &DependentsOptions,
) -> Result<Vec<PathBuf>> {
    if target.as_os_str().is_empty() {
        return Err(Error::Config("target filename must be given".to_string()));
    }
    if directory.as_os_str().is_empty() {
        return Err(Error::Config("directory must be given".to_string()));
    }

    let lookup = Dependents::new(directory, options.clone())?;
    let index = lookup.build_for(target)?;
    Ok(index.dependents_of(target))
}

/// Canonical key for a queried file.
///
/// Existing files are resolved on disk so they match walked paths under the
/// canonical root; anything else is normalized lexically.
fn resolve_target(root: &Path, target: &Path) -> CanonicalPath {
    let joined = root.join(target);
    match joined.canonicalize() {
        Ok(path) => CanonicalPath::new(path),
        Err(_) => CanonicalPath::new(joined),
    }
}
