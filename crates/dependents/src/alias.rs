//! Lexical alias substitution for module specifiers.
//!
//! The first `/`-separated segment of a specifier is looked up in the
//! config's `paths` table and replaced by its target. Substitution happens
//! once; a target that itself starts with another alias is not expanded
//! again. Where a relative target ends up on disk is decided later by the
//! canonicalizer, which anchors it at the config's base directory.

use std::borrow::Cow;

use crate::config::ModuleAliasConfig;

/// A specifier after alias lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasResolution<'a> {
    /// The (possibly rewritten) specifier
    pub specifier: Cow<'a, str>,
    /// Whether an alias matched
    pub aliased: bool,
}

impl<'a> AliasResolution<'a> {
    fn unchanged(specifier: &'a str) -> Self {
        Self {
            specifier: Cow::Borrowed(specifier),
            aliased: false,
        }
    }

    /// The specifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.specifier
    }
}

/// Rewrite `raw` through the alias table of `config`.
///
/// With no config, or no matching alias, the specifier is returned as is.
#[must_use]
pub fn resolve<'a>(config: Option<&ModuleAliasConfig>, raw: &'a str) -> AliasResolution<'a> {
    let Some(config) = config else {
        return AliasResolution::unchanged(raw);
    };

    let (head, rest) = match raw.split_once('/') {
        Some((head, rest)) => (head, rest),
        None => (raw, ""),
    };

    let Some(target) = config.alias_target(head) else {
        return AliasResolution::unchanged(raw);
    };

    let trimmed = target.trim_end_matches('/');
    let rewritten = if rest.is_empty() {
        // An alias pointing at "/" keeps its root
        if trimmed.is_empty() { target } else { trimmed }.to_string()
    } else {
        format!("{trimmed}/{rest}")
    };

    AliasResolution {
        specifier: Cow::Owned(rewritten),
        aliased: true,
    }
}
