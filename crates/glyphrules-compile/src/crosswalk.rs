// this_file: crates/glyphrules-compile/src/crosswalk.rs

//! Origin to destination codepoint crosswalks.

use glyphrules_core::Codepoint;

/// Crosswalk of one patch set, ordered by origin codepoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crosswalk {
    /// Patch set name
    pub patch_set: String,
    /// Position of the patch set in declaration order
    pub index: usize,
    pub exact: bool,
    pairs: Vec<(Codepoint, Codepoint)>,
}

impl Crosswalk {
    pub fn new(
        patch_set: impl Into<String>,
        index: usize,
        exact: bool,
        mut pairs: Vec<(Codepoint, Codepoint)>,
    ) -> Self {
        pairs.sort_unstable();
        pairs.dedup_by_key(|pair| pair.0);
        Self {
            patch_set: patch_set.into(),
            index,
            exact,
            pairs,
        }
    }

    pub fn pairs(&self) -> &[(Codepoint, Codepoint)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Destination codepoint for `origin`.
    pub fn dest_for(&self, origin: Codepoint) -> Option<Codepoint> {
        self.pairs
            .binary_search_by_key(&origin, |pair| pair.0)
            .ok()
            .map(|i| self.pairs[i].1)
    }

    pub fn destinations(&self) -> impl Iterator<Item = Codepoint> + '_ {
        self.pairs.iter().map(|pair| pair.1)
    }
}
