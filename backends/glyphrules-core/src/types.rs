// this_file: backends/glyphrules-core/src/types.rs

//! Core types shared by the extraction and compilation stages.

use std::collections::BTreeMap;

/// Unicode scalar value as used by fonts and patch sets.
pub type Codepoint = u32;

/// Alignment along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Align {
    Start,
    End,
    Center,
    /// Any alignment letter the patcher uses that has no dedicated mode
    None,
}

impl Align {
    /// Parse a patcher alignment letter. An empty string means unset.
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "l" => Some(Self::Start),
            "r" => Some(Self::End),
            "c" => Some(Self::Center),
            "" => None,
            _ => Some(Self::None),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Center => "center",
            Self::None => "none",
        }
    }
}

/// Rendering attributes for one codepoint, as written in a patch set.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    /// Horizontal alignment (`None` when unset)
    pub align: Option<Align>,
    /// Vertical alignment (`None` when unset)
    pub valign: Option<Align>,
    /// Stretch flag string, e.g. `"pa1"` or `"^xy"`
    pub stretch: String,
    /// Horizontal overlap into neighbouring cells
    pub overlap: f64,
    /// Maximum width/height ratio; non-positive when unset
    pub xy_ratio: f64,
    /// Total vertical padding
    pub y_padding: f64,
    pub relative_x: f64,
    pub relative_y: f64,
    pub relative_width: f64,
    pub relative_height: f64,
}

impl Default for AttributeEntry {
    fn default() -> Self {
        Self {
            align: None,
            valign: None,
            stretch: String::new(),
            overlap: 0.0,
            xy_ratio: -1.0,
            y_padding: 0.0,
            relative_x: 0.0,
            relative_y: 0.0,
            relative_width: 1.0,
            relative_height: 1.0,
        }
    }
}

/// Attribute table of a patch set: a default plus per-codepoint overrides.
///
/// Override keys are origin codepoints, i.e. they use the numbering of the
/// font the patch set was written against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSetAttributes {
    pub default: AttributeEntry,
    pub overrides: BTreeMap<Codepoint, AttributeEntry>,
}

impl PatchSetAttributes {
    pub fn new(default: AttributeEntry) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Entry for an origin codepoint, falling back to the default.
    pub fn for_codepoint(&self, origin: Codepoint) -> &AttributeEntry {
        self.overrides.get(&origin).unwrap_or(&self.default)
    }
}

/// One scale group, in origin codepoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleGroup {
    List(Vec<Codepoint>),
    /// Half-open range, as written with `range(start, stop)`
    Range { start: Codepoint, stop: Codepoint },
}

impl ScaleGroup {
    pub fn codepoints(&self) -> Vec<Codepoint> {
        match self {
            Self::List(cps) => cps.clone(),
            Self::Range { start, stop } => (*start..*stop).collect(),
        }
    }
}

/// Scale rules of a patch set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleRules {
    pub groups: Vec<ScaleGroup>,
    /// Shift mode hint; carried through but not interpreted
    pub shift_mode: Option<String>,
}

/// A single enabled patch set extracted from the patcher source.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSetDescriptor {
    pub name: String,
    /// Origin font path relative to the glyph directory
    pub source_filename: String,
    /// Identity mapping when true, packed mapping from `src_start` otherwise
    pub exact: bool,
    pub sym_start: Codepoint,
    pub sym_end: Codepoint,
    pub src_start: Option<Codepoint>,
    pub scale_rules: Option<ScaleRules>,
    pub attributes: PatchSetAttributes,
}

impl PatchSetDescriptor {
    /// Inclusive origin codepoint span covered by this patch set.
    pub fn span(&self) -> std::ops::RangeInclusive<Codepoint> {
        self.sym_start..=self.sym_end
    }
}

/// Glyph outline bounds in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Extend only the vertical extent to cover `other`.
    pub fn union_vertical(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
            ..*self
        }
    }
}
