//! The reverse dependency index.
//!
//! Maps each dependency to the set of files that import it. A file gets a
//! key the first time it appears on either side of an edge, so "no key" and
//! "empty set" both mean "nothing depends on this".
//!
//! Merging is set union per key, which makes it commutative and idempotent:
//! partial indexes from workers can be folded in any order, any number of
//! times, with the same result.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::types::CanonicalPath;

/// Dependency → dependents mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    entries: HashMap<CanonicalPath, HashSet<CanonicalPath>>,
}

impl ReverseIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `path` has a key, without adding any dependents.
    pub fn ensure(&mut self, path: CanonicalPath) {
        self.entries.entry(path).or_default();
    }

    /// Record that `dependent` imports `dependency`.
    ///
    /// Both paths get keys. Returns `false` if the edge was already present.
    pub fn add_edge(&mut self, dependency: CanonicalPath, dependent: CanonicalPath) -> bool {
        if let Entry::Vacant(vacant) = self.entries.entry(dependent.clone()) {
            vacant.insert(HashSet::new());
        }
        self.entries.entry(dependency).or_default().insert(dependent)
    }

    /// Fold every key and edge of `other` into this index.
    pub fn merge(&mut self, other: ReverseIndex) {
        if self.entries.is_empty() {
            self.entries = other.entries;
            return;
        }
        for (dependency, dependents) in other.entries {
            self.entries.entry(dependency).or_default().extend(dependents);
        }
    }

    /// Files that directly import `path`, in no particular order.
    pub fn dependents_of<'a>(
        &'a self,
        path: &CanonicalPath,
    ) -> impl Iterator<Item = &'a CanonicalPath> + use<'a> {
        self.entries.get(path).into_iter().flatten()
    }

    /// Whether `path` has a key.
    #[must_use]
    pub fn contains(&self, path: &CanonicalPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    /// Iterate over `(dependency, dependents)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalPath, &HashSet<CanonicalPath>)> {
        self.entries.iter()
    }
}
