// this_file: backends/glyphrules-core/src/utils.rs

//! Utility functions shared across the glyphrules stages.

use crate::types::Codepoint;
use crate::Result;
use std::io::Write;
use std::path::Path;

/// Inclusive codepoint range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodepointRange {
    pub start: Codepoint,
    pub end: Codepoint,
}

impl CodepointRange {
    pub fn new(start: Codepoint, end: Codepoint) -> Self {
        Self { start, end }
    }

    pub fn single(cp: Codepoint) -> Self {
        Self { start: cp, end: cp }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, cp: Codepoint) -> bool {
        self.start <= cp && cp <= self.end
    }

    pub fn iter(&self) -> impl Iterator<Item = Codepoint> {
        self.start..=self.end
    }
}

/// Coalesce codepoints into the minimal list of disjoint inclusive ranges.
///
/// Input order and duplicates do not matter; output is sorted ascending.
pub fn coalesce_codepoints(codepoints: &[Codepoint]) -> Vec<CodepointRange> {
    let mut sorted = codepoints.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<CodepointRange> = Vec::new();
    for cp in sorted {
        match ranges.last_mut() {
            Some(last) if last.end.checked_add(1) == Some(cp) => last.end = cp,
            _ => ranges.push(CodepointRange::single(cp)),
        }
    }
    ranges
}

/// Write `contents` to `path` through a temporary file in the same directory.
///
/// The destination is only replaced once every byte has been written, so a
/// failed write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    log::debug!(
        target: "glyphrules::io",
        "wrote {} bytes to {}",
        contents.len(),
        path.display()
    );
    Ok(())
}
