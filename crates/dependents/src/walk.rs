//! Candidate file discovery.
//!
//! Walks a project directory and yields every file with a supported
//! extension, skipping excluded directories and files. Directory exclusion
//! matches whole path segments by name, so `lib` skips every directory
//! called `lib` and `src/lib` skips nothing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, IndexError, Result};
use crate::types::SourceKind;

/// Directory names that are never scanned.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules", "bower_components", "vendor", ".git"];

/// Caller-supplied exclusion entries.
///
/// Built from a list, or from a comma-joined string as given on the command
/// line. Blank entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(Vec<String>);

impl Exclusions {
    /// Split a comma-joined list such as `"dist,*.min.js"`.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        list.split(',').map(str::to_string).collect()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for Exclusions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect(),
        )
    }
}

impl From<&str> for Exclusions {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl From<Vec<String>> for Exclusions {
    fn from(entries: Vec<String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<&[&str]> for Exclusions {
    fn from(entries: &[&str]) -> Self {
        entries.iter().map(|e| (*e).to_string()).collect()
    }
}

/// Compiled exclusion rules for one run.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    directories: HashSet<String>,
    file_names: HashSet<String>,
    file_globs: GlobSet,
}

impl ExclusionSet {
    /// Combine the default exclusions with `extra`.
    ///
    /// Entries containing a glob metacharacter (`*?[{`) are file patterns;
    /// any other entry excludes directories and files with that exact name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid glob pattern.
    pub fn new(extra: &Exclusions) -> Result<Self> {
        let mut directories: HashSet<String> =
            DEFAULT_EXCLUDED_DIRS.iter().map(|d| (*d).to_string()).collect();
        let mut file_names = HashSet::new();
        let mut globs = GlobSetBuilder::new();

        for entry in extra.iter() {
            if entry.contains(['*', '?', '[', '{']) {
                let glob = Glob::new(entry)
                    .map_err(|e| Error::Config(format!("invalid exclusion pattern {entry:?}: {e}")))?;
                globs.add(glob);
            } else {
                directories.insert(entry.to_string());
                file_names.insert(entry.to_string());
            }
        }

        let file_globs = globs
            .build()
            .map_err(|e| Error::Config(format!("invalid exclusion patterns: {e}")))?;

        Ok(Self {
            directories,
            file_names,
            file_globs,
        })
    }

    /// Whether a directory with this name is skipped.
    #[must_use]
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.directories.contains(name)
    }

    /// Whether a file with this name is skipped.
    #[must_use]
    pub fn excludes_file(&self, name: &str) -> bool {
        self.file_names.contains(name) || self.file_globs.is_match(name)
    }
}

/// Walk `root` and yield candidate source files in a stable order.
///
/// Entries that cannot be read are logged and skipped. Symbolic links are
/// not followed.
pub fn walk<'a>(root: &Path, exclusions: &'a ExclusionSet) -> impl Iterator<Item = PathBuf> + use<'a> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !exclusions.excludes_dir(&entry.file_name().to_string_lossy())
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    path = ?e.path(),
                    error = %e,
                    "Cannot read directory entry, skipping"
                );
                None
            }
        })
        .filter(move |entry| is_candidate(entry, exclusions))
        .map(DirEntry::into_path)
}

fn is_candidate(entry: &DirEntry, exclusions: &ExclusionSet) -> bool {
    entry.file_type().is_file()
        && SourceKind::from_path(entry.path()).is_some()
        && !exclusions.excludes_file(&entry.file_name().to_string_lossy())
}

/// Read a source file as UTF-8 text.
///
/// # Errors
///
/// Returns an [`IndexError`] for unreadable or non-UTF-8 files; the caller
/// treats them as having no content.
pub fn read_source(path: &Path) -> std::result::Result<String, IndexError> {
    let bytes = std::fs::read(path).map_err(|e| IndexError::io_error(path.to_path_buf(), &e))?;
    String::from_utf8(bytes).map_err(|_| IndexError::encoding_error(path.to_path_buf()))
}
