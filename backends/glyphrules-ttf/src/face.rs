// this_file: backends/glyphrules-ttf/src/face.rs

//! Parsed font faces exposed through [`FontAccess`].

use crate::outlines;
use camino::{Utf8Path, Utf8PathBuf};
use glyphrules_core::{BoundingBox, Codepoint, Error, FontAccess, Result};
use owned_ttf_parser::{AsFaceRef, OwnedFace};
use ttf_parser::GlyphId;

/// An owned, parsed outline font.
pub struct LoadedFont {
    path: Utf8PathBuf,
    face: OwnedFace,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("path", &self.path)
            .field("glyphs", &self.glyph_count())
            .finish()
    }
}

impl LoadedFont {
    /// Parse `data`; `path` is only used for diagnostics.
    ///
    /// Fonts without `glyf` or `CFF ` outlines are rejected as invalid.
    pub fn from_bytes(path: impl Into<Utf8PathBuf>, data: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let face = OwnedFace::from_vec(data, 0).map_err(|e| Error::InvalidFont {
            path: path.clone().into_std_path_buf(),
            reason: format!("Failed to parse font file: {e}"),
        })?;
        let tables = face.as_face_ref().tables();
        if tables.glyf.is_none() && tables.cff.is_none() {
            return Err(Error::InvalidFont {
                path: path.into_std_path_buf(),
                reason: "font has no outline table".to_string(),
            });
        }
        Ok(Self { path, face })
    }

    /// Read and parse the font at `path`.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let data = std::fs::read(path.as_std_path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FontNotFound {
                path: path.as_std_path().to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_bytes(path, data)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn glyph_count(&self) -> u16 {
        self.face.as_face_ref().number_of_glyphs()
    }

    pub fn units_per_em(&self) -> u16 {
        self.face.as_face_ref().units_per_em()
    }

    fn glyph_id(glyph: u32) -> Option<GlyphId> {
        u16::try_from(glyph).ok().map(GlyphId)
    }
}

impl FontAccess for LoadedFont {
    fn glyph_index(&self, codepoint: Codepoint) -> Option<u32> {
        let ch = char::from_u32(codepoint)?;
        self.face
            .as_face_ref()
            .glyph_index(ch)
            .filter(|gid| gid.0 != 0)
            .map(|gid| u32::from(gid.0))
    }

    fn glyph_bounds(&self, glyph: u32) -> Option<BoundingBox> {
        outlines::glyph_bounds(self.face.as_face_ref(), Self::glyph_id(glyph)?)
    }

    fn glyph_advance(&self, glyph: u32) -> Option<f64> {
        self.face
            .as_face_ref()
            .glyph_hor_advance(Self::glyph_id(glyph)?)
            .map(f64::from)
    }
}
