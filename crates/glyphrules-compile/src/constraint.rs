// this_file: crates/glyphrules-compile/src/constraint.rs

//! Canonical rendering constraints derived from patch-set attributes.

use glyphrules_core::{Align, AttributeEntry};

/// How a glyph is sized into its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeMode {
    Cover,
    FitCover,
    Stretch,
}

impl SizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::FitCover => "fit_cover",
            Self::Stretch => "stretch",
        }
    }
}

/// Which height a glyph is scaled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeightMode {
    /// Icon height rather than the full cell height
    Icon,
}

impl HeightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icon => "icon",
        }
    }
}

/// Fully resolved constraint for one codepoint. `None` fields are unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintRecord {
    pub size: Option<SizeMode>,
    pub height: Option<HeightMode>,
    pub max_constraint_width: Option<u8>,
    pub align_horizontal: Option<Align>,
    pub align_vertical: Option<Align>,
    pub relative_width: Option<f64>,
    pub relative_height: Option<f64>,
    pub relative_x: Option<f64>,
    pub relative_y: Option<f64>,
    pub pad_left: Option<f64>,
    pub pad_right: Option<f64>,
    pub pad_top: Option<f64>,
    pub pad_bottom: Option<f64>,
    pub max_xy_ratio: Option<f64>,
}

/// Hashable identity of a [`ConstraintRecord`].
///
/// Floats are compared by bit pattern with negative zero folded into zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    size: Option<SizeMode>,
    height: Option<HeightMode>,
    max_constraint_width: Option<u8>,
    align: (Option<Align>, Option<Align>),
    floats: [Option<u64>; 9],
}

impl ConstraintRecord {
    /// Canonicalize a patch-set attribute entry.
    pub fn from_entry(entry: &AttributeEntry) -> Self {
        let stretch = entry.stretch.as_str();
        let mut record = ConstraintRecord {
            size: size_mode(stretch, entry.overlap),
            align_horizontal: entry.align,
            align_vertical: entry.valign,
            ..Default::default()
        };

        if !stretch.contains('^') {
            record.height = Some(HeightMode::Icon);
        }
        if stretch.contains('1') || (!stretch.contains("pa") && !stretch.contains('2')) {
            record.max_constraint_width = Some(1);
        }

        record.relative_width = unless_eq(entry.relative_width, 1.0);
        record.relative_height = unless_eq(entry.relative_height, 1.0);
        record.relative_x = unless_eq(entry.relative_x, 0.0);
        record.relative_y = unless_eq(entry.relative_y, 0.0);

        if entry.overlap != 0.0 {
            let horizontal = -entry.overlap / 2.0;
            // vertical overlap is capped
            let vertical = -entry.overlap.min(0.01) / 2.0;
            record.pad_left = Some(horizontal);
            record.pad_right = Some(horizontal);
            record.pad_top = Some(vertical);
            record.pad_bottom = Some(vertical);
        } else if entry.y_padding != 0.0 {
            record.pad_top = Some(entry.y_padding / 2.0);
            record.pad_bottom = Some(entry.y_padding / 2.0);
        }

        if entry.xy_ratio > 0.0 {
            record.max_xy_ratio = Some(entry.xy_ratio);
        }
        record
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            size: self.size,
            height: self.height,
            max_constraint_width: self.max_constraint_width,
            align: (self.align_horizontal, self.align_vertical),
            floats: [
                self.relative_width,
                self.relative_height,
                self.relative_x,
                self.relative_y,
                self.pad_left,
                self.pad_right,
                self.pad_top,
                self.pad_bottom,
                self.max_xy_ratio,
            ]
            .map(|value| value.map(float_bits)),
        }
    }
}

fn size_mode(stretch: &str, overlap: f64) -> Option<SizeMode> {
    if stretch.contains("pa") {
        if stretch.contains('!') || overlap != 0.0 {
            Some(SizeMode::Cover)
        } else {
            Some(SizeMode::FitCover)
        }
    } else if stretch.contains("xy") {
        Some(SizeMode::Stretch)
    } else {
        None
    }
}

fn unless_eq(value: f64, identity: f64) -> Option<f64> {
    (value != identity).then_some(value)
}

fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}
