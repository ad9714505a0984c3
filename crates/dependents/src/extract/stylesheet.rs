//! Sass and Stylus import extraction.
//!
//! Both languages import with an at-rule followed by one or more
//! comma-separated specifiers, quoted or (in the indented syntaxes) bare.
//! Imports that stay plain CSS at runtime are skipped: `url(...)`, remote
//! URLs, `.css` files and Sass built-in modules.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtractError, Extractor, strip_comments};

static SASS_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)@(?:import|use|forward)\s+([^;\n{]+)").expect("sass import regex is valid")
});

static STYLUS_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*@(?:import|require)\s+([^;\n{]+)").expect("stylus import regex is valid")
});

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^'\n]*)'|"([^"\n]*)""#).expect("quoted regex is valid"));

/// Extractor for `@import`, `@use` and `@forward` in `.scss` and `.sass` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SassExtractor;

/// Extractor for `@import` and `@require` in `.styl` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct StylusExtractor;

impl Extractor for SassExtractor {
    fn extract(&self, content: &str) -> Result<Vec<String>, ExtractError> {
        extract_with(&SASS_IMPORT_RE, content)
    }
}

impl Extractor for StylusExtractor {
    fn extract(&self, content: &str) -> Result<Vec<String>, ExtractError> {
        extract_with(&STYLUS_IMPORT_RE, content)
    }
}

fn extract_with(rule: &Regex, content: &str) -> Result<Vec<String>, ExtractError> {
    let text = strip_comments(content)?;

    let mut specifiers = Vec::new();
    for caps in rule.captures_iter(&text) {
        let Some(args) = caps.get(1) else { continue };
        specifiers.extend(rule_arguments(args.as_str()).into_iter().filter(|s| is_importable(s)));
    }
    Ok(specifiers)
}

/// Specifiers named by the argument list of one import rule.
fn rule_arguments(args: &str) -> Vec<String> {
    if args.contains("url(") {
        return Vec::new();
    }

    let quoted: Vec<String> = QUOTED_RE
        .captures_iter(args)
        .filter_map(|caps| caps.iter().skip(1).flatten().next())
        .map(|m| m.as_str().to_string())
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }

    // Indented syntax: `@import foo, bar/baz`
    args.split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty() && !arg.contains(char::is_whitespace))
        .map(ToString::to_string)
        .collect()
}

fn is_importable(specifier: &str) -> bool {
    !(specifier.is_empty()
        || specifier.starts_with("sass:")
        || specifier.starts_with("http://")
        || specifier.starts_with("https://")
        || specifier.starts_with("//")
        || specifier.to_ascii_lowercase().ends_with(".css"))
}
