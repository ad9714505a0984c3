//! Turning import specifiers into canonical file paths.
//!
//! Script specifiers (CommonJS, ES modules, AMD) resolve relative ids
//! against the importing file's directory and everything else against the
//! base directory. An id with no recognized extension names the first of
//! `name.js`, `name.jsx`, ... `name.tsx` that exists, or `name.js` when none
//! does. The target does not have to exist.
//!
//! Stylesheet specifiers (Sass, Stylus) probe the disk, because a partial
//! `_name.scss` is imported as `name`. When no candidate exists the plain
//! `name.<ext>` spelling is used so the edge is still recorded.

use std::path::{Component, Path, PathBuf};

use crate::types::{CanonicalPath, JS_EXTENSIONS, ModuleFamily};

/// Extensions that mark a script specifier as already complete.
const SCRIPT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "json", "html", "htm", "css", "txt", "hbs",
];

const SASS_EXTENSIONS: &[&str] = &["scss", "sass"];

const STYLUS_EXTENSIONS: &[&str] = &["styl"];

/// Directories a specifier can be resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRoots {
    /// Root of the scanned project
    pub project_root: PathBuf,
    /// Where non-relative module ids live: the project root, or `baseUrl` under it
    pub base_dir: PathBuf,
}

impl ResolveRoots {
    /// Roots for a project with no `baseUrl`.
    #[must_use]
    pub fn new(project_root: &Path) -> Self {
        let project_root = normalize(project_root);
        Self {
            base_dir: project_root.clone(),
            project_root,
        }
    }

    /// Roots with an explicit base directory.
    #[must_use]
    pub fn with_base_dir(project_root: &Path, base_dir: &Path) -> Self {
        Self {
            project_root: normalize(project_root),
            base_dir: normalize(base_dir),
        }
    }
}

/// Normalize `.` and `..` components without consulting the file system.
///
/// `..` at the root is dropped; leading `..` in a relative path is kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
        }
    }
    out
}

/// Whether a specifier is explicitly relative (`./`, `../`, `.` or `..`).
#[must_use]
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolve `specifier`, written in a file inside `importer_dir`, to the
/// canonical path of the file it names.
#[must_use]
pub fn canonicalize(
    specifier: &str,
    importer_dir: &Path,
    roots: &ResolveRoots,
    family: ModuleFamily,
) -> CanonicalPath {
    if family.is_script() {
        return canonicalize_script(specifier, importer_dir, roots);
    }
    let extensions = match family {
        ModuleFamily::Stylus => STYLUS_EXTENSIONS,
        _ => SASS_EXTENSIONS,
    };
    canonicalize_stylesheet(specifier, importer_dir, roots, extensions)
}

fn canonicalize_script(specifier: &str, importer_dir: &Path, roots: &ResolveRoots) -> CanonicalPath {
    let anchor = if is_relative_specifier(specifier) {
        importer_dir
    } else {
        roots.base_dir.as_path()
    };
    let joined = normalize(&anchor.join(specifier));

    if has_extension(&joined, SCRIPT_EXTENSIONS) {
        return CanonicalPath::new(joined);
    }

    let plain = append_extension(&joined, "js");
    if plain.is_file() {
        return CanonicalPath::new(plain);
    }
    JS_EXTENSIONS
        .iter()
        .map(|ext| append_extension(&joined, ext))
        .find(|candidate| candidate.is_file())
        .map_or_else(|| CanonicalPath::new(plain), CanonicalPath::new)
}

fn canonicalize_stylesheet(
    specifier: &str,
    importer_dir: &Path,
    roots: &ResolveRoots,
    extensions: &[&str],
) -> CanonicalPath {
    let local = normalize(&importer_dir.join(specifier));

    // Plain CSS imports are taken literally
    if has_extension(&local, &["css"]) {
        return CanonicalPath::new(local);
    }

    let candidates = stylesheet_candidates(&local, extensions);
    if let Some(found) = candidates.iter().find(|c| c.is_file()) {
        return CanonicalPath::new(found);
    }

    // Load-path style: the same name under the base directory
    if !is_relative_specifier(specifier) && !Path::new(specifier).is_absolute() {
        let from_base = normalize(&roots.base_dir.join(specifier));
        if let Some(found) = stylesheet_candidates(&from_base, extensions)
            .iter()
            .find(|c| c.is_file())
        {
            return CanonicalPath::new(found);
        }
    }

    // Nothing on disk: the first candidate is the plain spelling
    CanonicalPath::new(&candidates[0])
}

/// Files a stylesheet import of `base` may refer to, in preference order.
///
/// For `dir/name` with `.scss`: `dir/name.scss`, `dir/_name.scss`, then the
/// same for the remaining extensions, then `dir/name/_index.scss` and
/// `dir/name/index.scss`. An explicit extension narrows the list to the
/// plain and partial spellings of that exact file.
fn stylesheet_candidates(base: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let dir = base.parent().unwrap_or_else(|| Path::new(""));
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if has_extension(base, extensions) {
        return vec![base.to_path_buf(), dir.join(format!("_{name}"))];
    }

    let mut candidates = Vec::with_capacity(extensions.len() * 4);
    for ext in extensions {
        candidates.push(dir.join(format!("{name}.{ext}")));
        candidates.push(dir.join(format!("_{name}.{ext}")));
    }
    for ext in extensions {
        candidates.push(base.join(format!("_index.{ext}")));
        candidates.push(base.join(format!("index.{ext}")));
    }
    candidates
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|known| known.eq_ignore_ascii_case(e)))
}

/// Append `.ext` to the file name, keeping any dots already in it.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn roots() -> ResolveRoots {
        ResolveRoots::new(Path::new("/project"))
    }

    #[rstest]
    #[case::cur_dir("/a/./b", "/a/b")]
    #[case::parent_dir("/a/b/../c", "/a/c")]
    #[case::parent_at_root("/../a", "/a")]
    #[case::relative_leading_parent("../a/b", "../a/b")]
    #[case::trailing_parent("/a/b/..", "/a")]
    fn normalizes_lexically(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(input)), PathBuf::from(expected));
    }

    #[rstest]
    #[case::dot_slash("./b", "/project/lib", "/project/lib/b.js")]
    #[case::parent("../util/x", "/project/lib", "/project/util/x.js")]
    #[case::bare_resolves_from_root("foo/bar", "/project/lib/deep", "/project/foo/bar.js")]
    #[case::keeps_known_extension("./data.json", "/project", "/project/data.json")]
    #[case::keeps_js_extension("./b.js", "/project", "/project/b.js")]
    #[case::dotted_name_gets_extension("./jquery.min", "/project", "/project/jquery.min.js")]
    #[case::absolute("/elsewhere/x", "/project", "/elsewhere/x.js")]
    fn canonicalizes_script_specifiers(
        #[case] specifier: &str,
        #[case] importer_dir: &str,
        #[case] expected: &str,
    ) {
        let path = canonicalize(
            specifier,
            Path::new(importer_dir),
            &roots(),
            ModuleFamily::CommonJs,
        );

        assert_eq!(path.as_path(), Path::new(expected));
    }

    #[rstest]
    #[case::typescript("util.ts")]
    #[case::tsx("Button.tsx")]
    #[case::jsx("Button.jsx")]
    #[case::module("esm.mjs")]
    fn extensionless_script_finds_other_js_extensions(#[case] file: &str) {
        let dir = tempfile::tempdir().expect("should create temp dir");
        fs::write(dir.path().join(file), "").expect("should write");
        let stem = Path::new(file).file_stem().expect("has stem").to_string_lossy().into_owned();

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize(&format!("./{stem}"), dir.path(), &roots, ModuleFamily::Es6);

        assert_eq!(path.as_path(), normalize(&dir.path().join(file)));
    }

    #[test]
    fn plain_js_wins_over_other_extensions() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        fs::write(dir.path().join("util.js"), "").expect("should write");
        fs::write(dir.path().join("util.ts"), "").expect("should write");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("./util", dir.path(), &roots, ModuleFamily::CommonJs);

        assert_eq!(path.as_path(), normalize(&dir.path().join("util.js")));
    }

    #[test]
    fn same_file_from_different_importers_is_identical() {
        let from_lib = canonicalize("./a", Path::new("/project/lib"), &roots(), ModuleFamily::Es6);
        let from_sibling = canonicalize(
            "../lib/a",
            Path::new("/project/src"),
            &roots(),
            ModuleFamily::Es6,
        );

        assert_eq!(from_lib, from_sibling);
    }

    #[test]
    fn bare_specifier_uses_base_dir() {
        let roots = ResolveRoots::with_base_dir(Path::new("/project"), Path::new("/project/js"));

        let path = canonicalize("app/main", Path::new("/project/js/app"), &roots, ModuleFamily::Amd);

        assert_eq!(path.as_path(), Path::new("/project/js/app/main.js"));
    }

    #[test]
    fn sass_falls_back_to_partial() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let styles = dir.path().join("styles");
        fs::create_dir_all(&styles).expect("should create dir");
        fs::write(styles.join("_foo.scss"), "$x: 1;").expect("should write partial");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("foo", &styles, &roots, ModuleFamily::Sass);

        assert_eq!(path.as_path(), normalize(&styles.join("_foo.scss")));
    }

    #[test]
    fn sass_prefers_plain_file_over_partial() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        fs::write(dir.path().join("foo.scss"), "").expect("should write");
        fs::write(dir.path().join("_foo.scss"), "").expect("should write");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("foo", dir.path(), &roots, ModuleFamily::Sass);

        assert_eq!(path.as_path(), normalize(&dir.path().join("foo.scss")));
    }

    #[test]
    fn sass_nested_import_resolves_within_subdirectory() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let nested = dir.path().join("sub").join("dir");
        fs::create_dir_all(&nested).expect("should create dirs");
        fs::write(nested.join("_name.scss"), "").expect("should write");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("sub/dir/name", dir.path(), &roots, ModuleFamily::Sass);

        assert_eq!(path.as_path(), normalize(&nested.join("_name.scss")));
    }

    #[test]
    fn sass_indented_syntax_is_found() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        fs::write(dir.path().join("_mixins.sass"), "").expect("should write");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("mixins", dir.path(), &roots, ModuleFamily::Sass);

        assert_eq!(path.as_path(), normalize(&dir.path().join("_mixins.sass")));
    }

    #[test]
    fn sass_missing_target_uses_plain_spelling() {
        let path = canonicalize(
            "missing",
            Path::new("/project/styles"),
            &roots(),
            ModuleFamily::Sass,
        );

        assert_eq!(path.as_path(), Path::new("/project/styles/missing.scss"));
    }

    #[test]
    fn sass_css_import_is_literal() {
        let path = canonicalize(
            "vendor/reset.css",
            Path::new("/project/styles"),
            &roots(),
            ModuleFamily::Sass,
        );

        assert_eq!(path.as_path(), Path::new("/project/styles/vendor/reset.css"));
    }

    #[test]
    fn stylus_falls_back_to_partial() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        fs::write(dir.path().join("_vars.styl"), "").expect("should write");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("vars", dir.path(), &roots, ModuleFamily::Stylus);

        assert_eq!(path.as_path(), normalize(&dir.path().join("_vars.styl")));
    }

    #[test]
    fn stylus_directory_import_uses_index() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let theme = dir.path().join("theme");
        fs::create_dir_all(&theme).expect("should create dir");
        fs::write(theme.join("index.styl"), "").expect("should write");

        let roots = ResolveRoots::new(dir.path());
        let path = canonicalize("theme", dir.path(), &roots, ModuleFamily::Stylus);

        assert_eq!(path.as_path(), normalize(&theme.join("index.styl")));
    }

    #[test]
    fn relative_specifier_detection() {
        assert!(is_relative_specifier("./a"));
        assert!(is_relative_specifier("../a"));
        assert!(is_relative_specifier(".."));
        assert!(!is_relative_specifier("a/b"));
        assert!(!is_relative_specifier(".hidden/a"));
    }
}
