// this_file: crates/glyphrules-compile/src/resolver.rs

//! Scale-group geometry.
//!
//! Members of a scale group are sized relative to the union of the group's
//! outlines instead of individually. Group membership is written in origin
//! codepoints and resolved through the patch set's crosswalk.

use crate::crosswalk::Crosswalk;
use crate::policy::{overlap_policy, stand_in, OverlapPolicy, Situation};
use glyphrules_core::{
    AttributeEntry, BoundingBox, Codepoint, Error, FontAccess, PatchSetDescriptor, Result,
    ScaleGroup,
};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

/// Outline geometry collected for one scale group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupGeometry {
    /// Union of member outlines, vertically extended by any stand-in
    pub bounds: BoundingBox,
    /// Destination codepoints with their own outline bounds, in group order
    pub members: Vec<(Codepoint, BoundingBox)>,
    /// Distinct advance widths, by bit pattern
    advances: Vec<u64>,
}

impl GroupGeometry {
    /// More than one member and a single shared advance width.
    pub fn is_monospace(&self) -> bool {
        self.members.len() > 1 && self.advances.len() == 1
    }
}

/// Counters for one patch set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub groups: usize,
    pub assigned: usize,
}

/// Applies scale-group geometry from the destination font.
pub struct ScaleGroupResolver<'a> {
    font: &'a dyn FontAccess,
}

impl<'a> ScaleGroupResolver<'a> {
    pub fn new(font: &'a dyn FontAccess) -> Self {
        Self { font }
    }

    /// Measure one group; `None` when no member has an outline.
    pub fn measure(
        &self,
        descriptor: &PatchSetDescriptor,
        crosswalk: &Crosswalk,
        group: &ScaleGroup,
    ) -> Option<GroupGeometry> {
        let mut bounds: Option<BoundingBox> = None;
        let mut vertical: Option<BoundingBox> = None;
        let mut members = Vec::new();
        let mut advances: Vec<u64> = Vec::new();

        for origin in group.codepoints() {
            let Some(dest) = crosswalk.dest_for(origin) else {
                if let Some(extent) = stand_in(&descriptor.name, origin).and_then(|cp| self.outline(cp)) {
                    debug!(
                        target: "glyphrules::scale",
                        "'{}': {origin:#x} measured through its stand-in",
                        descriptor.name
                    );
                    vertical = Some(vertical.map_or(extent.0, |v| v.union(&extent.0)));
                } else {
                    debug!(
                        target: "glyphrules::scale",
                        "'{}': scale group member {origin:#x} is not mapped",
                        descriptor.name
                    );
                }
                continue;
            };
            let Some((member, advance)) = self.outline(dest) else {
                warn!(
                    target: "glyphrules::scale",
                    "'{}': scale group member {dest:#x} has no outline",
                    descriptor.name
                );
                continue;
            };
            bounds = Some(bounds.map_or(member, |b| b.union(&member)));
            if let Some(advance) = advance {
                let bits = advance.to_bits();
                if !advances.contains(&bits) {
                    advances.push(bits);
                }
            }
            members.push((dest, member));
        }

        let mut bounds = bounds?;
        if let Some(extent) = vertical {
            bounds = bounds.union_vertical(&extent);
        }
        Some(GroupGeometry {
            bounds,
            members,
            advances,
        })
    }

    /// Write relative geometry into `entries`, which are keyed by destination codepoint.
    pub fn apply(
        &self,
        descriptor: &PatchSetDescriptor,
        crosswalk: &Crosswalk,
        entries: &mut BTreeMap<Codepoint, AttributeEntry>,
    ) -> Result<ResolverStats> {
        let mut stats = ResolverStats::default();
        let Some(rules) = &descriptor.scale_rules else {
            return Ok(stats);
        };
        let mut grouped: HashSet<Codepoint> = HashSet::new();

        for (index, group) in rules.groups.iter().enumerate() {
            let Some(geometry) = self.measure(descriptor, crosswalk, group) else {
                debug!(
                    target: "glyphrules::scale",
                    "'{}': scale group #{index} has no resolvable member",
                    descriptor.name
                );
                continue;
            };
            let (width, height) = (geometry.bounds.width(), geometry.bounds.height());
            if height <= 0.0 || width <= 0.0 {
                return Err(Error::geometry(
                    &descriptor.name,
                    index,
                    format!("group bounds are {width} x {height} font units"),
                ));
            }
            stats.groups += 1;

            let monospace = geometry.is_monospace();
            for &(dest, member) in &geometry.members {
                let Some(entry) = entries.get_mut(&dest) else {
                    continue;
                };
                if !grouped.insert(dest) {
                    match overlap_policy(&descriptor.name, Situation::ScaleGroupMembership) {
                        Some(OverlapPolicy::KeepEarlier) => continue,
                        Some(OverlapPolicy::Overwrite) => {}
                        None => {
                            return Err(Error::Overlap {
                                patch_set: descriptor.name.clone(),
                                codepoint: dest,
                            })
                        }
                    }
                }
                let group_bounds = &geometry.bounds;
                entry.relative_height = member.height() / height;
                entry.relative_y = (member.y_min - group_bounds.y_min) / height;
                if monospace {
                    entry.relative_width = member.width() / width;
                    entry.relative_x = (member.x_min - group_bounds.x_min) / width;
                }
                stats.assigned += 1;
            }
        }
        Ok(stats)
    }

    fn outline(&self, cp: Codepoint) -> Option<(BoundingBox, Option<f64>)> {
        let glyph = self.font.glyph_index(cp)?;
        let bounds = self.font.glyph_bounds(glyph)?;
        Some((bounds, self.font.glyph_advance(glyph)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glyphrules_core::test_support::MemoryFont;
    use glyphrules_core::{PatchSetAttributes, ScaleRules};

    fn descriptor(name: &str, groups: Vec<ScaleGroup>) -> PatchSetDescriptor {
        PatchSetDescriptor {
            name: name.to_string(),
            source_filename: "x.otf".to_string(),
            exact: true,
            sym_start: 0xf000,
            sym_end: 0xf0ff,
            src_start: None,
            scale_rules: Some(ScaleRules {
                groups,
                shift_mode: None,
            }),
            attributes: PatchSetAttributes::default(),
        }
    }

    fn identity(cps: &[Codepoint]) -> Crosswalk {
        Crosswalk::new("test", 0, true, cps.iter().map(|&cp| (cp, cp)).collect())
    }

    fn entries(cps: &[Codepoint]) -> BTreeMap<Codepoint, AttributeEntry> {
        cps.iter().map(|&cp| (cp, AttributeEntry::default())).collect()
    }

    #[test]
    fn monospace_group_gets_horizontal_geometry() {
        let font = MemoryFont::new()
            .with_glyph(0xf000, BoundingBox::new(0.0, 0.0, 10.0, 100.0), 600.0)
            .with_glyph(0xf001, BoundingBox::new(10.0, 50.0, 20.0, 100.0), 600.0)
            .with_glyph(0xf002, BoundingBox::new(20.0, 0.0, 30.0, 50.0), 600.0);
        let cps = [0xf000, 0xf001, 0xf002];
        let d = descriptor("Test", vec![ScaleGroup::List(cps.to_vec())]);
        let mut map = entries(&cps);

        let stats = ScaleGroupResolver::new(&font)
            .apply(&d, &identity(&cps), &mut map)
            .unwrap();
        assert_eq!(stats, ResolverStats { groups: 1, assigned: 3 });

        let middle = &map[&0xf001];
        assert_relative_eq!(middle.relative_width, 10.0 / 30.0);
        assert_relative_eq!(middle.relative_x, 10.0 / 30.0);
        assert_relative_eq!(middle.relative_height, 0.5);
        assert_relative_eq!(middle.relative_y, 0.5);
        assert_relative_eq!(map[&0xf000].relative_height, 1.0);
    }

    #[test]
    fn varying_advances_skip_horizontal_geometry() {
        let font = MemoryFont::new()
            .with_glyph(0xf000, BoundingBox::new(0.0, 0.0, 10.0, 100.0), 600.0)
            .with_glyph(0xf001, BoundingBox::new(10.0, 0.0, 20.0, 50.0), 650.0);
        let cps = [0xf000, 0xf001];
        let d = descriptor("Test", vec![ScaleGroup::List(cps.to_vec())]);
        let mut map = entries(&cps);
        ScaleGroupResolver::new(&font)
            .apply(&d, &identity(&cps), &mut map)
            .unwrap();
        assert_eq!(map[&0xf001].relative_width, 1.0);
        assert_eq!(map[&0xf001].relative_x, 0.0);
        assert_relative_eq!(map[&0xf001].relative_height, 0.5);
    }

    #[test]
    fn single_member_is_not_monospace() {
        let font = MemoryFont::new().with_glyph(0xf000, BoundingBox::new(5.0, 0.0, 10.0, 10.0), 600.0);
        let d = descriptor("Test", vec![]);
        let geometry = ScaleGroupResolver::new(&font)
            .measure(&d, &identity(&[0xf000]), &ScaleGroup::List(vec![0xf000]))
            .unwrap();
        assert!(!geometry.is_monospace());
    }

    #[test]
    fn first_group_wins() {
        let font = MemoryFont::new()
            .with_glyph(0xf000, BoundingBox::new(0.0, 0.0, 10.0, 100.0), 600.0)
            .with_glyph(0xf001, BoundingBox::new(0.0, 0.0, 10.0, 50.0), 600.0)
            .with_glyph(0xf002, BoundingBox::new(0.0, 0.0, 10.0, 200.0), 600.0);
        let cps = [0xf000, 0xf001, 0xf002];
        let d = descriptor(
            "Test",
            vec![
                ScaleGroup::List(vec![0xf000, 0xf001]),
                ScaleGroup::List(vec![0xf001, 0xf002]),
            ],
        );
        let mut map = entries(&cps);
        ScaleGroupResolver::new(&font)
            .apply(&d, &identity(&cps), &mut map)
            .unwrap();
        assert_relative_eq!(map[&0xf001].relative_height, 0.5);
        assert_relative_eq!(map[&0xf002].relative_height, 1.0);
    }

    #[test]
    fn unmapped_members_and_empty_groups_are_skipped() {
        let font = MemoryFont::new()
            .with_glyph(0xf000, BoundingBox::new(0.0, 0.0, 10.0, 100.0), 600.0)
            .with_empty_glyph(0xf001, 600.0);
        let cps = [0xf000, 0xf001];
        let d = descriptor(
            "Test",
            vec![
                ScaleGroup::Range { start: 0xf000, stop: 0xf004 },
                ScaleGroup::List(vec![0xf001, 0xf0f0]),
            ],
        );
        let mut map = entries(&cps);
        let stats = ScaleGroupResolver::new(&font)
            .apply(&d, &identity(&cps), &mut map)
            .unwrap();
        assert_eq!(stats, ResolverStats { groups: 1, assigned: 1 });
        assert_eq!(map[&0xf001], AttributeEntry::default());
    }

    #[test]
    fn degenerate_group_is_a_geometry_error() {
        let font = MemoryFont::new()
            .with_glyph(0xf000, BoundingBox::new(0.0, 10.0, 10.0, 10.0), 600.0)
            .with_glyph(0xf001, BoundingBox::new(10.0, 10.0, 20.0, 10.0), 600.0);
        let cps = [0xf000, 0xf001];
        let d = descriptor("Flat", vec![ScaleGroup::List(cps.to_vec())]);
        let err = ScaleGroupResolver::new(&font)
            .apply(&d, &identity(&cps), &mut entries(&cps))
            .unwrap_err();
        assert!(matches!(err, Error::Geometry { group: 0, .. }), "{err}");
    }

    #[test]
    fn stand_in_extends_only_the_vertical_extent() {
        let font = MemoryFont::new()
            .with_glyph(0xf0dd, BoundingBox::new(-50.0, -100.0, 500.0, 100.0), 600.0)
            .with_glyph(0xf0de, BoundingBox::new(0.0, 0.0, 100.0, 100.0), 600.0);
        // 0xf0dc is not mapped; 0xf0dd is mapped but outside this group
        let walk = identity(&[0xf0dd, 0xf0de]);
        let d = descriptor("Font Awesome", vec![]);
        let geometry = ScaleGroupResolver::new(&font)
            .measure(&d, &walk, &ScaleGroup::List(vec![0xf0dc, 0xf0de]))
            .unwrap();
        assert_eq!(geometry.bounds, BoundingBox::new(0.0, -100.0, 100.0, 100.0));
        assert_eq!(geometry.members.len(), 1);

        let other = descriptor("Octicons", vec![]);
        let geometry = ScaleGroupResolver::new(&font)
            .measure(&other, &walk, &ScaleGroup::List(vec![0xf0dc, 0xf0de]))
            .unwrap();
        assert_eq!(geometry.bounds, BoundingBox::new(0.0, 0.0, 100.0, 100.0));
    }
}
