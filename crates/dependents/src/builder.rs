//! Per-file edge discovery.
//!
//! For one file: detect its module family, extract raw specifiers, rewrite
//! them through the alias table, canonicalize, and record one edge per
//! specifier. Malformed files are reported and skipped; they never abort
//! the surrounding build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::alias;
use crate::canonical::{ResolveRoots, canonicalize, is_relative_specifier};
use crate::config::ModuleAliasConfig;
use crate::error::IndexError;
use crate::extract::{detect_family, extractor_for};
use crate::index::ReverseIndex;
use crate::types::CanonicalPath;
use crate::walk::read_source;

/// Outcome of indexing a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    /// Files attempted, including ones that failed
    pub files_processed: usize,
    /// Edges recorded, counting duplicates
    pub edges_recorded: usize,
    /// Files skipped because they could not be read or parsed
    pub errors: Vec<IndexError>,
}

impl ChunkReport {
    /// Add another report's counts and errors to this one.
    pub fn absorb(&mut self, other: ChunkReport) {
        self.files_processed += other.files_processed;
        self.edges_recorded += other.edges_recorded;
        self.errors.extend(other.errors);
    }
}

/// Records dependency edges for files of one project.
///
/// Holds only read-only resolution context, so one builder can be shared by
/// every worker of a build.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    roots: ResolveRoots,
    alias_config: Option<Arc<ModuleAliasConfig>>,
}

impl IndexBuilder {
    /// Create a builder for the project at `project_root`.
    ///
    /// With an alias config, non-relative ids resolve from its `baseUrl`.
    #[must_use]
    pub fn new(project_root: &Path, alias_config: Option<Arc<ModuleAliasConfig>>) -> Self {
        let roots = match &alias_config {
            Some(config) => ResolveRoots::with_base_dir(project_root, &config.base_dir(project_root)),
            None => ResolveRoots::new(project_root),
        };
        Self {
            roots,
            alias_config,
        }
    }

    /// The alias config in effect, if any.
    #[must_use]
    pub fn alias_config(&self) -> Option<&Arc<ModuleAliasConfig>> {
        self.alias_config.as_ref()
    }

    /// Record the edges declared by `content`, the text of `path`.
    ///
    /// Empty or absent content is a no-op. Files whose family has no
    /// extractor contribute nothing. Returns the number of edges recorded.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] when extraction fails; the index is left
    /// untouched for this file.
    pub fn process_file(
        &self,
        index: &mut ReverseIndex,
        path: &Path,
        content: Option<&str>,
    ) -> Result<usize, IndexError> {
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            return Ok(0);
        };
        let Some(family) = detect_family(path, content) else {
            return Ok(0);
        };
        let Some(extractor) = extractor_for(family) else {
            trace!(file = %path.display(), %family, "No extractor for family");
            return Ok(0);
        };

        let specifiers = extractor
            .extract(content)
            .map_err(|e| IndexError::parse_failed(path.to_path_buf(), e.to_string()))?;

        let importer = CanonicalPath::new(self.roots.project_root.join(path));
        let importer_dir = importer
            .parent()
            .map_or_else(|| self.roots.project_root.clone(), Path::to_path_buf);

        index.ensure(importer.clone());

        let config = self.alias_config.as_deref();
        for raw in &specifiers {
            let resolved = alias::resolve(config, raw);
            // Relative alias targets are anchored at the base directory
            let anchor = if resolved.aliased && is_relative_specifier(resolved.as_str()) {
                &self.roots.base_dir
            } else {
                &importer_dir
            };
            let dependency = canonicalize(resolved.as_str(), anchor, &self.roots, family);
            trace!(
                file = %importer,
                specifier = %raw,
                dependency = %dependency,
                "Recorded edge"
            );
            index.add_edge(dependency, importer.clone());
        }

        Ok(specifiers.len())
    }

    /// Read `path` from disk and record its edges.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] when the file cannot be read, is not
    /// UTF-8, or fails extraction.
    pub fn process_path(&self, index: &mut ReverseIndex, path: &Path) -> Result<usize, IndexError> {
        let content = read_source(path)?;
        self.process_file(index, path, Some(&content))
    }

    /// Index every file in `files`, logging and collecting per-file errors.
    pub fn process_files(&self, index: &mut ReverseIndex, files: &[PathBuf]) -> ChunkReport {
        let mut report = ChunkReport::default();
        for path in files {
            report.files_processed += 1;
            match self.process_path(index, path) {
                Ok(edges) => report.edges_recorded += edges,
                Err(e) => {
                    warn!(
                        file = %e.path.display(),
                        kind = %e.kind,
                        error = %e.message,
                        "Skipping file"
                    );
                    report.errors.push(e);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AliasTarget;
    use crate::error::IndexErrorKind;
    use std::fs;

    fn root() -> PathBuf {
        PathBuf::from("/project")
    }

    fn path(rel: &str) -> CanonicalPath {
        CanonicalPath::new(root().join(rel))
    }

    fn dependents(index: &ReverseIndex, rel: &str) -> Vec<CanonicalPath> {
        let mut found: Vec<_> = index.dependents_of(&path(rel)).cloned().collect();
        found.sort();
        found
    }

    #[test]
    fn records_commonjs_edge() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        let edges = builder
            .process_file(&mut index, &root().join("a.js"), Some("require('./b');"))
            .expect("should process");

        assert_eq!(edges, 1);
        assert_eq!(dependents(&index, "b.js"), [path("a.js")]);
        assert!(index.contains(&path("a.js")));
    }

    #[test]
    fn empty_content_is_a_no_op() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        assert_eq!(builder.process_file(&mut index, &root().join("a.js"), Some("")), Ok(0));
        assert_eq!(builder.process_file(&mut index, &root().join("a.js"), None), Ok(0));
        assert!(index.is_empty());
    }

    #[test]
    fn unsupported_extension_is_a_no_op() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        let edges = builder
            .process_file(&mut index, &root().join("notes.txt"), Some("require('./a')"))
            .expect("should process");

        assert_eq!(edges, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn file_without_imports_still_gets_a_key() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        builder
            .process_file(&mut index, &root().join("b.js"), Some("module.exports = 1;"))
            .expect("should process");

        assert!(index.contains(&path("b.js")));
        assert!(dependents(&index, "b.js").is_empty());
    }

    #[test]
    fn processing_order_does_not_matter() {
        let builder = IndexBuilder::new(&root(), None);
        let a = (root().join("a.js"), "require('./b');");
        let b = (root().join("b.js"), "module.exports = {};");

        let mut forward = ReverseIndex::new();
        for (file, content) in [&a, &b] {
            builder.process_file(&mut forward, file, Some(*content)).expect("ok");
        }
        let mut backward = ReverseIndex::new();
        for (file, content) in [&b, &a] {
            builder.process_file(&mut backward, file, Some(*content)).expect("ok");
        }

        assert_eq!(forward, backward);
        assert_eq!(dependents(&forward, "b.js"), [path("a.js")]);
    }

    #[test]
    fn processing_a_file_twice_does_not_duplicate() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        for _ in 0..2 {
            builder
                .process_file(&mut index, &root().join("a.js"), Some("require('./b'); require('./b');"))
                .expect("ok");
        }

        assert_eq!(dependents(&index, "b.js"), [path("a.js")]);
        assert_eq!(index.edge_count(), 1);
    }

    #[test]
    fn amd_alias_resolves_against_base_url() {
        let mut config = ModuleAliasConfig {
            base_url: "js".to_string(),
            ..ModuleAliasConfig::default()
        };
        config
            .paths
            .insert("foobar".to_string(), AliasTarget::Single("./c".to_string()));
        let builder = IndexBuilder::new(&root(), Some(Arc::new(config)));
        let mut index = ReverseIndex::new();

        builder
            .process_file(
                &mut index,
                &root().join("js/app/b.js"),
                Some("define(['foobar', './sibling', 'lib/x'], function () {});"),
            )
            .expect("should process");

        assert_eq!(dependents(&index, "js/c.js"), [path("js/app/b.js")]);
        assert_eq!(dependents(&index, "js/app/sibling.js"), [path("js/app/b.js")]);
        assert_eq!(dependents(&index, "js/lib/x.js"), [path("js/app/b.js")]);
    }

    #[test]
    fn relative_importer_path_is_anchored_at_root() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        builder
            .process_file(&mut index, Path::new("lib/a.js"), Some("require('./b');"))
            .expect("should process");

        assert_eq!(dependents(&index, "lib/b.js"), [path("lib/a.js")]);
    }

    #[test]
    fn malformed_file_reports_parse_failure() {
        let builder = IndexBuilder::new(&root(), None);
        let mut index = ReverseIndex::new();

        let err = builder
            .process_file(&mut index, &root().join("bad.js"), Some("require('./a');\n/* open"))
            .expect_err("should fail");

        assert_eq!(err.kind, IndexErrorKind::ParseFailed);
        assert!(index.is_empty(), "a failed file records nothing");
    }

    #[test]
    fn process_files_collects_errors_and_continues() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let good = dir.path().join("good.js");
        let bad = dir.path().join("bad.js");
        fs::write(&good, "require('./dep');").expect("write");
        fs::write(&bad, "define(['./dep'").expect("write");
        let missing = dir.path().join("missing.js");

        let builder = IndexBuilder::new(dir.path(), None);
        let mut index = ReverseIndex::new();
        let report = builder.process_files(&mut index, &[bad, good.clone(), missing]);

        assert_eq!(report.files_processed, 3);
        assert_eq!(report.edges_recorded, 1);
        assert_eq!(report.errors.len(), 2);
        let dep = CanonicalPath::new(dir.path().join("dep.js"));
        assert_eq!(
            index.dependents_of(&dep).cloned().collect::<Vec<_>>(),
            [CanonicalPath::new(&good)]
        );
    }

    #[test]
    fn sass_partial_edges_use_partial_path() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        fs::write(dir.path().join("_vars.scss"), "$c: red;").expect("write");
        let main = dir.path().join("main.scss");
        fs::write(&main, "@import 'vars';").expect("write");

        let builder = IndexBuilder::new(dir.path(), None);
        let mut index = ReverseIndex::new();
        builder.process_path(&mut index, &main).expect("should process");

        let partial = CanonicalPath::new(dir.path().join("_vars.scss"));
        assert_eq!(
            index.dependents_of(&partial).cloned().collect::<Vec<_>>(),
            [CanonicalPath::new(&main)]
        );
    }
}
