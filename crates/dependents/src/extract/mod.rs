//! Import specifier extraction.
//!
//! Each module family implements the `Extractor` trait, which pulls the raw
//! specifiers (`./a`, `foo/bar`, `../partial`) out of a file's text exactly
//! as they were written. Resolution happens elsewhere.
//!
//! ## Adding a New Family
//!
//! 1. Add the variant to `ModuleFamily` in `types.rs`
//! 2. Create a new module implementing `Extractor`
//! 3. Register it in `extractor_for()`
//!
//! Extraction is regex based and works on comment-free text produced by
//! [`strip_comments`]. Syntax the patterns do not recognize simply yields no
//! specifiers; only text the stripper cannot get through is an error.

mod amd;
mod javascript;
mod source;
mod stylesheet;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub use amd::AmdExtractor;
pub use javascript::JavaScriptExtractor;
pub use source::strip_comments;
pub use stylesheet::{SassExtractor, StylusExtractor};

use crate::types::{ModuleFamily, SourceKind};

/// Recoverable failure to extract specifiers from one file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ExtractError {
    /// What went wrong
    pub message: String,
    /// Byte offset where the problem was detected
    pub offset: usize,
}

impl ExtractError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Pulls raw import specifiers out of source text.
pub trait Extractor: Send + Sync {
    /// Specifiers in source order. Duplicates are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the text is malformed badly enough that
    /// no reliable specifier list can be produced.
    fn extract(&self, content: &str) -> Result<Vec<String>, ExtractError>;
}

/// Get the extractor for a module family.
///
/// Returns `None` for families without an extractor; their files contribute
/// no dependencies.
#[must_use]
#[allow(clippy::unnecessary_wraps)] // Option return keeps room for families without an extractor
pub fn extractor_for(family: ModuleFamily) -> Option<&'static dyn Extractor> {
    match family {
        ModuleFamily::CommonJs | ModuleFamily::Es6 => Some(&JavaScriptExtractor),
        ModuleFamily::Amd => Some(&AmdExtractor),
        ModuleFamily::Sass => Some(&SassExtractor),
        ModuleFamily::Stylus => Some(&StylusExtractor),
    }
}

static AMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^.\w$])(?:define\s*\(|(?:require|requirejs)\s*\(\s*\[)")
        .expect("AMD detection regex is valid")
});

static ES6_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:import\s*['\x22{*\w]|export\s+(?:\{|\*|default\b|const\b|let\b|var\b|function\b|class\b|async\b))")
        .expect("ES module detection regex is valid")
});

/// Decide the module family of a file from its path and content.
///
/// JavaScript files are AMD when they call `define(...)` or
/// `require([...])`, ES modules when a line starts with `import`/`export`,
/// and CommonJS otherwise. Returns `None` for unsupported extensions.
#[must_use]
pub fn detect_family(path: &Path, content: &str) -> Option<ModuleFamily> {
    match SourceKind::from_path(path)? {
        SourceKind::Sass => Some(ModuleFamily::Sass),
        SourceKind::Stylus => Some(ModuleFamily::Stylus),
        SourceKind::JavaScript => {
            // Commented-out code must not decide the family
            let stripped = strip_comments(content);
            let text = stripped.as_deref().unwrap_or(content);
            if AMD_RE.is_match(text) {
                Some(ModuleFamily::Amd)
            } else if ES6_RE.is_match(text) {
                Some(ModuleFamily::Es6)
            } else {
                Some(ModuleFamily::CommonJs)
            }
        }
    }
}

/// First participating capture group of a match.
///
/// Patterns use one group per quote style, so exactly one of them is set.
fn quoted(caps: &regex::Captures<'_>) -> Option<(usize, String)> {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| (m.start(), m.as_str().to_string()))
}
