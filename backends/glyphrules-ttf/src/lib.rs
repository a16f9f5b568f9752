// this_file: backends/glyphrules-ttf/src/lib.rs

//! ttf-parser implementation of [`glyphrules_core::FontAccess`].
//!
//! Covers destination and origin font loading, tight outline bounds through
//! kurbo, and the version-scoped origin font cache.

pub mod face;
pub mod fetch;
pub mod loader;
pub mod outlines;

pub use face::LoadedFont;
pub use fetch::{sanitize_filename, CachedOriginFonts, MirrorFetcher, DEFAULT_TEMPLATE};
pub use loader::{CacheStats, FontLoader, MAX_FONT_SIZE};
