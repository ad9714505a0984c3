//! Comment removal shared by all extractors.

use super::ExtractError;

/// Replace `//` and `/* */` comments with whitespace, keeping string
/// literals, regex literals and line structure intact.
///
/// Single- and double-quoted strings end at an unescaped newline, since a
/// stray quote must not swallow the rest of the file. Template literals may
/// span lines. A `/` where an expression may start (after an operator, an
/// opening bracket or a keyword such as `return`) opens a regex literal,
/// which ends at its closing `/` or at the end of the line.
///
/// # Errors
///
/// Returns [`ExtractError`] for an unterminated block comment or template
/// literal.
pub fn strip_comments(content: &str) -> Result<String, ExtractError> {
    let bytes = content.as_bytes();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    // Start of the pending run of bytes copied verbatim
    let mut run = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&content[run..i]);
                let end = content[i..].find('\n').map_or(bytes.len(), |n| i + n);
                i = end;
                run = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&content[run..i]);
                let Some(close) = content[i + 2..].find("*/") else {
                    return Err(ExtractError::new("unterminated block comment", i));
                };
                let end = i + 2 + close + 2;
                // Keep line numbers stable
                out.extend(content[i..end].chars().filter(|c| *c == '\n'));
                i = end;
                run = end;
            }
            quote @ (b'\'' | b'"') => {
                i = skip_line_string(bytes, i + 1, quote);
            }
            b'`' => {
                i = skip_template(bytes, i + 1)
                    .ok_or_else(|| ExtractError::new("unterminated template literal", i))?;
            }
            b'/' if regex_allowed(&out, &content[run..i]) => {
                i = skip_regex(bytes, i + 1);
            }
            _ => i += 1,
        }
    }

    out.push_str(&content[run..]);
    Ok(out)
}

/// Index just past the closing quote, or of the newline/end that ends the string.
fn skip_line_string(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Keywords after which `/` starts a regex rather than a division.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "case", "do", "else", "in", "of", "new", "delete", "void",
    "throw", "yield", "await",
];

/// Whether a `/` following `stripped` then `pending` begins a regex literal.
fn regex_allowed(stripped: &str, pending: &str) -> bool {
    let before = match pending.trim_end() {
        "" => stripped.trim_end(),
        tail => tail,
    };
    let Some(last) = before.chars().next_back() else {
        return true;
    };
    if "(,=:[!&|?{};+-*%<>~^".contains(last) {
        return true;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    if is_word(last) {
        let word = &before[before.trim_end_matches(is_word).len()..];
        return REGEX_KEYWORDS.contains(&word);
    }
    false
}

/// Index just past a regex literal's closing `/`, or of the newline/end
/// that cuts it short. `[...]` classes may contain `/`.
fn skip_regex(bytes: &[u8], mut i: usize) -> usize {
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_template(bytes: &[u8], mut i: usize) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
