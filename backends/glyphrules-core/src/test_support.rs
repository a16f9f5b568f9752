// this_file: backends/glyphrules-core/src/test_support.rs

//! In-memory collaborators for tests and benchmarks.
//!
//! These are not backed by font files: glyph identifiers equal codepoints and
//! every glyph carries an explicit bounding box and advance.

use crate::traits::{FontAccess, OriginFonts};
use crate::types::{BoundingBox, Codepoint};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
struct MemoryGlyph {
    bounds: Option<BoundingBox>,
    advance: f64,
}

/// A font whose glyphs are declared directly by codepoint.
#[derive(Debug, Clone, Default)]
pub struct MemoryFont {
    glyphs: BTreeMap<Codepoint, MemoryGlyph>,
}

impl MemoryFont {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a glyph with outline bounds and advance width.
    pub fn with_glyph(mut self, cp: Codepoint, bounds: BoundingBox, advance: f64) -> Self {
        self.glyphs.insert(
            cp,
            MemoryGlyph {
                bounds: Some(bounds),
                advance,
            },
        );
        self
    }

    /// Add a glyph without an outline.
    pub fn with_empty_glyph(mut self, cp: Codepoint, advance: f64) -> Self {
        self.glyphs.insert(
            cp,
            MemoryGlyph {
                bounds: None,
                advance,
            },
        );
        self
    }

    /// Add unit-box glyphs for every codepoint yielded by `cps`.
    pub fn with_codepoints(mut self, cps: impl IntoIterator<Item = Codepoint>) -> Self {
        for cp in cps {
            self.glyphs.insert(
                cp,
                MemoryGlyph {
                    bounds: Some(BoundingBox::new(0.0, 0.0, 1000.0, 1000.0)),
                    advance: 1000.0,
                },
            );
        }
        self
    }
}

impl FontAccess for MemoryFont {
    fn glyph_index(&self, codepoint: Codepoint) -> Option<u32> {
        self.glyphs.contains_key(&codepoint).then_some(codepoint)
    }

    fn glyph_bounds(&self, glyph: u32) -> Option<BoundingBox> {
        self.glyphs.get(&glyph).and_then(|g| g.bounds)
    }

    fn glyph_advance(&self, glyph: u32) -> Option<f64> {
        self.glyphs.get(&glyph).map(|g| g.advance)
    }
}

#[derive(Clone)]
enum OriginEntry {
    Font(Arc<MemoryFont>),
    NotAnOutlineFont,
}

/// Origin fonts keyed by filename; unknown filenames fail to fetch.
#[derive(Clone, Default)]
pub struct MemoryOriginFonts {
    fonts: HashMap<String, OriginEntry>,
    requests: usize,
}

impl MemoryOriginFonts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, filename: &str, font: MemoryFont) -> Self {
        self.fonts
            .insert(filename.to_string(), OriginEntry::Font(Arc::new(font)));
        self
    }

    /// Register a file that exists but does not parse as an outline font.
    pub fn with_unparseable(mut self, filename: &str) -> Self {
        self.fonts
            .insert(filename.to_string(), OriginEntry::NotAnOutlineFont);
        self
    }

    /// Number of `origin_font` calls served so far.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl OriginFonts for MemoryOriginFonts {
    fn origin_font(
        &mut self,
        version: &str,
        filename: &str,
    ) -> Result<Option<Arc<dyn FontAccess>>> {
        self.requests += 1;
        match self.fonts.get(filename) {
            Some(OriginEntry::Font(font)) => Ok(Some(font.clone() as Arc<dyn FontAccess>)),
            Some(OriginEntry::NotAnOutlineFont) => Ok(None),
            None => Err(Error::fetch(filename, version, "not present in memory store")),
        }
    }
}
