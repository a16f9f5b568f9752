// this_file: crates/glyphrules-compile/src/mapper.rs

//! Origin to destination codepoint mapping.

use crate::crosswalk::Crosswalk;
use crate::policy::{overlap_policy, stand_in, Situation};
use crate::store::CrosswalkSnapshot;
use glyphrules_core::{Codepoint, Error, FontAccess, OriginFonts, PatchSetDescriptor, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Crosswalks of one run and the snapshot to persist for the next.
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    /// One crosswalk per descriptor, in declaration order
    pub crosswalks: Vec<Crosswalk>,
    /// Replacement snapshot; `None` when the loaded one is still current
    pub snapshot: Option<CrosswalkSnapshot>,
    pub reused: usize,
    pub computed: usize,
}

/// Builds crosswalks against a destination font.
pub struct CodepointMapper<'a> {
    destination: &'a dyn FontAccess,
    origins: &'a mut dyn OriginFonts,
}

impl<'a> CodepointMapper<'a> {
    pub fn new(destination: &'a dyn FontAccess, origins: &'a mut dyn OriginFonts) -> Self {
        Self {
            destination,
            origins,
        }
    }

    /// Map every descriptor, reusing entries of `previous` where they are current.
    pub fn map_all(
        &mut self,
        version: &str,
        descriptors: &[PatchSetDescriptor],
        previous: Option<&CrosswalkSnapshot>,
    ) -> Result<MappingOutcome> {
        let mut crosswalks = Vec::with_capacity(descriptors.len());
        let mut claimed: HashMap<Codepoint, usize> = HashMap::new();
        let (mut reused, mut computed) = (0, 0);

        for (index, descriptor) in descriptors.iter().enumerate() {
            let cached = previous.and_then(|snapshot| {
                snapshot.reusable(version, index, &descriptor.name, descriptor.exact)
            });
            let crosswalk = match cached {
                Some(entry) => {
                    debug!(target: "glyphrules::map", "reusing cached crosswalk for '{}'", descriptor.name);
                    reused += 1;
                    entry.to_crosswalk()
                }
                None => {
                    computed += 1;
                    self.map_descriptor(version, index, descriptor)?
                }
            };
            self.check_destinations(&crosswalk, descriptors, &mut claimed)?;
            debug!(
                target: "glyphrules::map",
                "'{}': {} codepoints mapped",
                descriptor.name,
                crosswalk.len()
            );
            crosswalks.push(crosswalk);
        }

        let stale = computed > 0
            || previous.map_or(true, |snapshot| {
                snapshot.version != version || snapshot.entries.len() != crosswalks.len()
            });
        let snapshot = stale.then(|| CrosswalkSnapshot::from_crosswalks(version, &crosswalks));
        Ok(MappingOutcome {
            crosswalks,
            snapshot,
            reused,
            computed,
        })
    }

    /// Build the crosswalk of a single descriptor from its origin font.
    pub fn map_descriptor(
        &mut self,
        version: &str,
        index: usize,
        descriptor: &PatchSetDescriptor,
    ) -> Result<Crosswalk> {
        let Some(origin) = self.origin_map(version, descriptor)? else {
            return Ok(self.identity_fallback(index, descriptor));
        };

        let present = descriptor.span().filter(|&cp| origin.has_codepoint(cp));
        let mut pairs: Vec<(Codepoint, Codepoint)> = if descriptor.exact {
            present.map(|cp| (cp, cp)).collect()
        } else {
            let start = descriptor.src_start.ok_or_else(|| {
                Error::config(&descriptor.name, "packed mapping requires SrcStart")
            })?;
            present.zip(start..).collect()
        };
        // glyphs that only exist as a stand-in are measured, never mapped
        pairs.retain(|&(origin, dest)| {
            let dropped = stand_in(&descriptor.name, origin).is_some()
                && !self.destination.has_codepoint(dest);
            if dropped {
                debug!(
                    target: "glyphrules::map",
                    "'{}': {origin:#x} is represented by its stand-in",
                    descriptor.name
                );
            }
            !dropped
        });
        Ok(Crosswalk::new(
            descriptor.name.clone(),
            index,
            descriptor.exact,
            pairs,
        ))
    }

    fn origin_map(
        &mut self,
        version: &str,
        descriptor: &PatchSetDescriptor,
    ) -> Result<Option<Arc<dyn FontAccess>>> {
        let filename = &descriptor.source_filename;
        match self.origins.origin_font(version, filename) {
            Ok(Some(font)) => Ok(Some(font)),
            Ok(None) if descriptor.exact => {
                info!(
                    target: "glyphrules::map",
                    "'{}': {filename} has no outline map, assuming identity",
                    descriptor.name
                );
                Ok(None)
            }
            Ok(None) => Err(Error::mapping(
                &descriptor.name,
                format!("packed mapping needs the character map of {filename}, which is not an outline font"),
            )),
            Err(err @ (Error::Fetch { .. } | Error::FontNotFound { .. })) if descriptor.exact => {
                warn!(
                    target: "glyphrules::map",
                    "'{}': {err}; assuming identity",
                    descriptor.name
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Identity over the span, restricted to what the destination font has.
    fn identity_fallback(&self, index: usize, descriptor: &PatchSetDescriptor) -> Crosswalk {
        let mut pairs = Vec::new();
        let mut skipped = 0usize;
        for cp in descriptor.span() {
            if self.destination.has_codepoint(cp) {
                pairs.push((cp, cp));
            } else {
                debug!(target: "glyphrules::map", "Skipping missing codepoint {cp:#x}");
                skipped += 1;
            }
        }
        if skipped > 0 {
            info!(
                target: "glyphrules::map",
                "'{}': skipped {skipped} codepoints missing from the destination font",
                descriptor.name
            );
        }
        Crosswalk::new(descriptor.name.clone(), index, true, pairs)
    }

    fn check_destinations(
        &self,
        crosswalk: &Crosswalk,
        descriptors: &[PatchSetDescriptor],
        claimed: &mut HashMap<Codepoint, usize>,
    ) -> Result<()> {
        let name = &crosswalk.patch_set;
        for &(origin, dest) in crosswalk.pairs() {
            if !self.destination.has_codepoint(dest) {
                return Err(Error::mapping(
                    name,
                    format!("destination codepoint {dest:#x} (origin {origin:#x}) is missing from the destination font"),
                ));
            }
            let Some(earlier) = claimed.insert(dest, crosswalk.index) else {
                continue;
            };
            let deferred = earlier != crosswalk.index
                && overlap_policy(name, Situation::PatchSetMerge).is_some();
            let owner = descriptors
                .get(earlier)
                .map_or("?", |d| d.name.as_str());
            if !deferred {
                return Err(Error::mapping(
                    name,
                    format!("destination codepoint {dest:#x} is already claimed by '{owner}'"),
                ));
            }
            debug!(
                target: "glyphrules::map",
                "'{name}': {dest:#x} is also claimed by '{owner}', resolved at merge"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotEntry;
    use glyphrules_core::test_support::{MemoryFont, MemoryOriginFonts};
    use glyphrules_core::PatchSetAttributes;

    fn descriptor(name: &str, span: (Codepoint, Codepoint), src_start: Option<Codepoint>) -> PatchSetDescriptor {
        PatchSetDescriptor {
            name: name.to_string(),
            source_filename: format!("{name}.otf"),
            exact: src_start.is_none(),
            sym_start: span.0,
            sym_end: span.1,
            src_start,
            scale_rules: None,
            attributes: PatchSetAttributes::default(),
        }
    }

    #[test]
    fn exact_mapping_keeps_origin_gaps() {
        let dest = MemoryFont::new().with_codepoints(0xe0a0..=0xe0a3);
        let mut origins = MemoryOriginFonts::new()
            .with_font("Powerline.otf", MemoryFont::new().with_codepoints([0xe0a0, 0xe0a2]));
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let walk = mapper
            .map_descriptor("3.4.0", 0, &descriptor("Powerline", (0xe0a0, 0xe0a3), None))
            .unwrap();
        assert_eq!(walk.pairs(), &[(0xe0a0, 0xe0a0), (0xe0a2, 0xe0a2)]);
    }

    #[test]
    fn stand_in_origins_missing_from_destination_are_dropped() {
        let dest = MemoryFont::new().with_codepoints([0xf0dd, 0xf0de]);
        let mut origins = MemoryOriginFonts::new().with_font(
            "Font Awesome.otf",
            MemoryFont::new().with_codepoints([0xf0dc, 0xf0dd, 0xf0de]),
        );
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let outcome = mapper
            .map_all("3.4.0", &[descriptor("Font Awesome", (0xf0dc, 0xf0de), None)], None)
            .unwrap();
        assert_eq!(outcome.crosswalks[0].dest_for(0xf0dc), None);
        assert_eq!(outcome.crosswalks[0].len(), 2);
    }

    #[test]
    fn packed_mapping_is_contiguous_and_increasing() {
        let dest = MemoryFont::new().with_codepoints(0xf400..0xf410);
        let origin = MemoryFont::new().with_codepoints([0xf000, 0xf003, 0xf004, 0xf0a0]);
        let mut origins = MemoryOriginFonts::new().with_font("Octicons.otf", origin);
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let walk = mapper
            .map_descriptor("3.4.0", 0, &descriptor("Octicons", (0xf000, 0xf105), Some(0xf400)))
            .unwrap();
        let dests: Vec<_> = walk.destinations().collect();
        assert_eq!(dests, vec![0xf400, 0xf401, 0xf402, 0xf403]);
        assert_eq!(walk.dest_for(0xf0a0), Some(0xf403));
    }

    #[test]
    fn missing_destination_glyph_is_a_mapping_error() {
        let dest = MemoryFont::new().with_codepoints([0xf400]);
        let mut origins = MemoryOriginFonts::new()
            .with_font("Octicons.otf", MemoryFont::new().with_codepoints([0xf000, 0xf001]));
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let err = mapper
            .map_all("3.4.0", &[descriptor("Octicons", (0xf000, 0xf001), Some(0xf400))], None)
            .unwrap_err();
        assert!(matches!(err, Error::Mapping { .. }), "{err}");
    }

    #[test]
    fn colliding_destinations_are_rejected_unless_a_policy_applies() {
        let dest = MemoryFont::new().with_codepoints(0xe000..0xe010);
        let origin = MemoryFont::new().with_codepoints(0xe000..0xe010);
        let mut origins = MemoryOriginFonts::new()
            .with_font("Pomicons.otf", origin.clone())
            .with_font("Weather.otf", origin.clone())
            .with_font("Octicons.otf", origin);

        let clash = [
            descriptor("Pomicons", (0xe000, 0xe003), None),
            descriptor("Weather", (0xe003, 0xe005), None),
        ];
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let err = mapper.map_all("3.4.0", &clash, None).unwrap_err();
        assert!(err.to_string().contains("0xe003"), "{err}");

        let deferred = [
            descriptor("Pomicons", (0xe000, 0xe003), None),
            descriptor("Octicons", (0xe003, 0xe005), None),
        ];
        let outcome = mapper.map_all("3.4.0", &deferred, None).unwrap();
        assert_eq!(outcome.crosswalks.len(), 2);
    }

    #[test]
    fn exact_mode_without_origin_map_uses_destination_cmap() {
        let dest = MemoryFont::new().with_codepoints([0xe300, 0xe302]);
        let mut origins = MemoryOriginFonts::new().with_unparseable("Weather.otf");
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let walk = mapper
            .map_descriptor("3.4.0", 0, &descriptor("Weather", (0xe300, 0xe303), None))
            .unwrap();
        assert_eq!(walk.pairs(), &[(0xe300, 0xe300), (0xe302, 0xe302)]);

        // an unfetchable origin font is tolerated the same way
        let walk = mapper
            .map_descriptor("3.4.0", 0, &descriptor("Elsewhere", (0xe300, 0xe303), None))
            .unwrap();
        assert_eq!(walk.len(), 2);
    }

    #[test]
    fn packed_mode_requires_origin_map() {
        let dest = MemoryFont::new().with_codepoints(0xf400..0xf410);
        let mut origins = MemoryOriginFonts::new().with_unparseable("Octicons.otf");
        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let packed = descriptor("Octicons", (0xf000, 0xf003), Some(0xf400));
        assert!(matches!(
            mapper.map_descriptor("3.4.0", 0, &packed),
            Err(Error::Mapping { .. })
        ));
        let missing = descriptor("Codicons", (0xf000, 0xf003), Some(0xf400));
        assert!(matches!(
            mapper.map_descriptor("3.4.0", 0, &missing),
            Err(Error::Fetch { .. })
        ));
    }

    #[test]
    fn current_snapshot_is_reused_without_touching_origin_fonts() {
        let dest = MemoryFont::new().with_codepoints(0xf400..0xf410);
        let mut origins = MemoryOriginFonts::new();
        let descriptors = [descriptor("Octicons", (0xf000, 0xf001), Some(0xf400))];
        let snapshot = CrosswalkSnapshot {
            version: "3.4.0".to_string(),
            entries: vec![SnapshotEntry {
                index: 0,
                name: "Octicons".to_string(),
                exact: false,
                pairs: vec![[0xf000, 0xf400], [0xf001, 0xf401]],
            }],
        };

        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let outcome = mapper.map_all("3.4.0", &descriptors, Some(&snapshot)).unwrap();
        assert_eq!((outcome.reused, outcome.computed), (1, 0));
        assert!(outcome.snapshot.is_none());
        assert_eq!(origins.requests(), 0);
    }

    #[test]
    fn version_mismatch_recomputes_everything() {
        let dest = MemoryFont::new().with_codepoints(0xf400..0xf410);
        let mut origins = MemoryOriginFonts::new()
            .with_font("Octicons.otf", MemoryFont::new().with_codepoints([0xf000, 0xf001]));
        let descriptors = [descriptor("Octicons", (0xf000, 0xf001), Some(0xf400))];
        let stale = CrosswalkSnapshot {
            version: "3.3.0".to_string(),
            entries: vec![],
        };

        let mut mapper = CodepointMapper::new(&dest, &mut origins);
        let outcome = mapper.map_all("3.4.0", &descriptors, Some(&stale)).unwrap();
        assert_eq!((outcome.reused, outcome.computed), (0, 1));
        let snapshot = outcome.snapshot.unwrap();
        assert_eq!(snapshot.version, "3.4.0");
        assert_eq!(snapshot.entries[0].pairs, vec![[0xf000, 0xf400], [0xf001, 0xf401]]);
    }
}
