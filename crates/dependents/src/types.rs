//! Domain types for dependents lookups.
//!
//! - **Identity**: `CanonicalPath` (a file's key in the reverse index)
//! - **Classification**: `ModuleFamily` (which import syntax and naming rules apply)
//! - **Results**: `BuildStats` (what a build did, including recoverable errors)
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | File identity | Lexically normalized absolute path | Lookups must not depend on disk state |
//! | Family | Enum not String | Adding a family requires an extractor and naming rules |
//! | JS sub-family | Detected from content | `.js` files may be CommonJS, ES modules or AMD |

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::canonical::normalize;
use crate::error::IndexError;

// ============================================================================
// Canonical paths
// ============================================================================

/// A normalized absolute path used as a file's identity in the index.
///
/// Construction normalizes `.` and `..` components lexically, so two
/// spellings of the same location compare equal without touching the disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    /// Normalize `path` into a canonical path.
    ///
    /// `path` is expected to be absolute; relative input stays relative.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize(path.as_ref()))
    }

    /// Borrow as a `Path`.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory containing this file.
    #[must_use]
    pub fn parent(&self) -> Option<&Path> {
        self.0.parent()
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<CanonicalPath> for PathBuf {
    fn from(path: CanonicalPath) -> Self {
        path.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

// ============================================================================
// Module families
// ============================================================================

/// File extensions treated as JavaScript sources.
pub const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Import syntax and file naming convention of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleFamily {
    /// `require('x')` modules
    CommonJs,
    /// `import ... from 'x'` modules
    Es6,
    /// RequireJS `define([...])` modules
    Amd,
    /// `.scss` / `.sass` stylesheets
    Sass,
    /// `.styl` stylesheets
    Stylus,
}

/// Coarse source kind, known from the extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Any JavaScript dialect; the family is decided from content
    JavaScript,
    /// Sass, either syntax
    Sass,
    /// Stylus
    Stylus,
}

impl SourceKind {
    /// Classify a file by extension.
    ///
    /// Returns `None` for extensions we do not index.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if JS_EXTENSIONS.contains(&ext.as_str()) {
            return Some(Self::JavaScript);
        }
        match ext.as_str() {
            "scss" | "sass" => Some(Self::Sass),
            "styl" => Some(Self::Stylus),
            _ => None,
        }
    }

    /// Classify a file by its path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl ModuleFamily {
    /// Whether specifiers of this family resolve like JavaScript modules.
    #[must_use]
    pub fn is_script(self) -> bool {
        matches!(self, Self::CommonJs | Self::Es6 | Self::Amd)
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommonJs => "commonjs",
            Self::Es6 => "es6",
            Self::Amd => "amd",
            Self::Sass => "sass",
            Self::Stylus => "stylus",
        }
    }
}

impl fmt::Display for ModuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Build results
// ============================================================================

/// How a build distributed its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every file indexed on the calling thread
    Sequential,
    /// Files distributed across a pool of workers
    Parallel {
        /// Workers spawned for the build
        workers: usize,
    },
}

/// Statistics from building a reverse index.
#[derive(Debug, Clone)]
pub struct BuildStats {
    /// Candidate files handed to the index builder
    pub files_processed: usize,
    /// Edges recorded, counting duplicates
    pub edges_recorded: usize,
    /// Strategy the build used
    pub strategy: Strategy,
    /// Chunks handed to workers (zero for sequential builds)
    pub chunks_dispatched: usize,
    /// Wall time of the build
    pub duration: Duration,
    /// Files that contributed no edges because they could not be read or parsed
    pub errors: Vec<IndexError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_path_equality_ignores_dot_segments() {
        let a = CanonicalPath::new("/project/lib/./a.js");
        let b = CanonicalPath::new("/project/src/../lib/a.js");

        assert_eq!(a, b);
        assert_eq!(a.as_path(), Path::new("/project/lib/a.js"));
    }

    #[test]
    fn source_kind_from_extension_is_case_insensitive() {
        assert_eq!(SourceKind::from_extension("JS"), Some(SourceKind::JavaScript));
        assert_eq!(SourceKind::from_extension("scss"), Some(SourceKind::Sass));
        assert_eq!(SourceKind::from_extension("sass"), Some(SourceKind::Sass));
        assert_eq!(SourceKind::from_extension("styl"), Some(SourceKind::Stylus));
        assert_eq!(SourceKind::from_extension("rs"), None);
    }

    #[test]
    fn source_kind_from_path_without_extension_is_none() {
        assert_eq!(SourceKind::from_path(Path::new("/project/Makefile")), None);
    }

    #[test]
    fn script_families() {
        assert!(ModuleFamily::Amd.is_script());
        assert!(ModuleFamily::Es6.is_script());
        assert!(!ModuleFamily::Sass.is_script());
        assert!(!ModuleFamily::Stylus.is_script());
    }
}
