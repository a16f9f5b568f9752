// this_file: backends/glyphrules-ttf/src/loader.rs

//! Font loading with an LRU cache of parsed faces keyed by path.

use crate::face::LoadedFont;
use camino::{Utf8Path, Utf8PathBuf};
use glyphrules_core::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Maximum allowed font file size (50MB)
pub const MAX_FONT_SIZE: u64 = 50 * 1024 * 1024;

const DEFAULT_CACHE_SIZE: usize = 32;

/// Font cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Maximum number of cached faces
    pub capacity: usize,
    /// Currently cached faces
    pub entries: usize,
}

/// Loads fonts from disk and keeps recently used faces parsed.
pub struct FontLoader {
    cache: Mutex<LruCache<Utf8PathBuf, Arc<LoadedFont>>>,
}

impl Default for FontLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl FontLoader {
    pub fn new(cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Load the font at `path`, returning the cached face when available.
    pub fn load(&self, path: &Utf8Path) -> Result<Arc<LoadedFont>> {
        if let Some(font) = self.cache.lock().get(path) {
            return Ok(Arc::clone(font));
        }

        let meta = std::fs::metadata(path.as_std_path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FontNotFound {
                path: path.as_std_path().to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        validate_font_size(path, meta.len())?;

        let font = Arc::new(LoadedFont::open(path)?);
        log::debug!(
            target: "glyphrules::fonts",
            "loaded {} ({} glyphs, {} upem)",
            path,
            font.glyph_count(),
            font.units_per_em()
        );
        self.cache.lock().put(path.to_path_buf(), Arc::clone(&font));
        Ok(font)
    }

    /// Drop every cached face.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            capacity: cache.cap().get(),
            entries: cache.len(),
        }
    }
}

/// Reject font files above [`MAX_FONT_SIZE`] before reading them.
pub fn validate_font_size(path: &Utf8Path, size_bytes: u64) -> Result<()> {
    if size_bytes > MAX_FONT_SIZE {
        return Err(Error::InvalidFont {
            path: path.as_std_path().to_path_buf(),
            reason: format!(
                "Font file too large: {size_bytes} bytes (max: {MAX_FONT_SIZE} bytes)"
            ),
        });
    }
    Ok(())
}
