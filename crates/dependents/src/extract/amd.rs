//! AMD / RequireJS specifier extraction.

use std::sync::LazyLock;

use regex::Regex;

use super::javascript::REQUIRE_RE;
use super::{ExtractError, Extractor, quoted, strip_comments};

/// Start of a dependency array: `define([`, `define('id', [`, `require([`.
static ARRAY_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[^.\w$])(?:define\s*\(\s*(?:(?:'[^'\n]*'|"[^"\n]*")\s*,\s*)?|(?:require|requirejs)\s*\(\s*)\["#,
    )
    .expect("AMD array regex is valid")
});

static ARRAY_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'([^'\n]*)'|"([^"\n]*)""#).expect("AMD array item regex is valid")
});

/// Module ids RequireJS provides itself.
const PSEUDO_MODULES: &[&str] = &["require", "exports", "module"];

/// Extractor for `define`/`require` dependency arrays plus the
/// simplified-CommonJS `require('x')` form used inside factories.
///
/// Loader-plugin ids (`text!./tpl.html`) contribute their resource part;
/// plugins with no resource (`domReady!`) contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmdExtractor;

impl Extractor for AmdExtractor {
    fn extract(&self, content: &str) -> Result<Vec<String>, ExtractError> {
        let text = strip_comments(content)?;

        let mut found: Vec<(usize, String)> = Vec::new();

        for start in ARRAY_START_RE.find_iter(&text) {
            let body_start = start.end();
            let Some(body_end) = array_end(&text, body_start) else {
                return Err(ExtractError::new("unterminated dependency array", start.start()));
            };
            let body = &text[body_start..body_end];
            found.extend(
                ARRAY_ITEM_RE
                    .captures_iter(body)
                    .filter_map(|caps| quoted(&caps))
                    .map(|(offset, id)| (body_start + offset, id)),
            );
        }

        found.extend(REQUIRE_RE.captures_iter(&text).filter_map(|caps| quoted(&caps)));
        found.sort_by_key(|(offset, _)| *offset);

        Ok(found
            .into_iter()
            .filter_map(|(_, id)| module_id(&id))
            .collect())
    }
}

/// Offset of the `]` closing an array whose body starts at `from`.
///
/// Brackets inside quoted ids do not count.
fn array_end(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        match (quote, bytes[i]) {
            (Some(_), b'\\') => i += 1,
            (Some(q), b) if b == q || b == b'\n' => quote = None,
            (None, b @ (b'\'' | b'"')) => quote = Some(b),
            (None, b']') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Strip a loader plugin prefix and drop ids that name no file.
fn module_id(id: &str) -> Option<String> {
    let resource = match id.split_once('!') {
        Some((_plugin, resource)) => resource,
        None => id,
    };
    if resource.is_empty() || PSEUDO_MODULES.contains(&resource) {
        return None;
    }
    Some(resource.to_string())
}
