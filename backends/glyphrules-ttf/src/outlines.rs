// this_file: backends/glyphrules-ttf/src/outlines.rs

//! Glyph outlines as kurbo paths, and their tight bounds.

use glyphrules_core::BoundingBox;
use kurbo::{BezPath, Point, Shape};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

/// Collects ttf-parser outline callbacks into a [`BezPath`] in font units.
#[derive(Default)]
pub(crate) struct PathRecorder {
    path: BezPath,
}

impl PathRecorder {
    pub(crate) fn finish(self) -> Option<BezPath> {
        (!self.path.elements().is_empty()).then_some(self.path)
    }
}

fn point(x: f32, y: f32) -> Point {
    Point::new(f64::from(x), f64::from(y))
}

impl OutlineBuilder for PathRecorder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(point(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(point(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.path.quad_to(point(x1, y1), point(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.path.curve_to(point(x1, y1), point(x2, y2), point(x, y));
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

/// Outline of `glyph_id`; `None` for glyphs that draw nothing.
pub fn glyph_path(face: &Face<'_>, glyph_id: GlyphId) -> Option<BezPath> {
    let mut recorder = PathRecorder::default();
    face.outline_glyph(glyph_id, &mut recorder)?;
    recorder.finish()
}

/// Tight bounds of a drawn path: curve extrema, not control points.
pub fn path_bounds(path: &BezPath) -> BoundingBox {
    let rect = path.bounding_box();
    BoundingBox::new(rect.x0, rect.y0, rect.x1, rect.y1)
}

/// Tight outline bounds of a glyph in font units.
pub fn glyph_bounds(face: &Face<'_>, glyph_id: GlyphId) -> Option<BoundingBox> {
    glyph_path(face, glyph_id).map(|path| path_bounds(&path))
}
