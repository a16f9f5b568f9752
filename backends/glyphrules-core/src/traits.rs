// this_file: backends/glyphrules-core/src/traits.rs

//! Seams between the compiler and its font and file collaborators.

use crate::types::{BoundingBox, Codepoint};
use crate::Result;
use std::sync::Arc;

/// Read access to a compiled font.
pub trait FontAccess {
    /// Glyph identifier from the best Unicode character map.
    fn glyph_index(&self, codepoint: Codepoint) -> Option<u32>;

    /// Tight outline bounds in font units; `None` for empty glyphs.
    fn glyph_bounds(&self, glyph: u32) -> Option<BoundingBox>;

    /// Horizontal advance in font units.
    fn glyph_advance(&self, glyph: u32) -> Option<f64>;

    fn has_codepoint(&self, codepoint: Codepoint) -> bool {
        self.glyph_index(codepoint).is_some()
    }
}

/// Retrieves origin font files that are not available locally.
pub trait FontFetcher {
    /// Fetch the bytes of `filename` as shipped with patcher `version`.
    fn fetch(&self, version: &str, filename: &str) -> Result<Vec<u8>>;
}

/// Provides origin fonts to the codepoint mapper.
pub trait OriginFonts {
    /// Origin font for `filename`.
    ///
    /// `Ok(None)` means the file exists but is not a usable outline font.
    /// `Err` means it could not be obtained at all.
    fn origin_font(&mut self, version: &str, filename: &str)
        -> Result<Option<Arc<dyn FontAccess>>>;
}
