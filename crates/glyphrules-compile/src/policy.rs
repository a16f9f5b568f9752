// this_file: crates/glyphrules-compile/src/policy.rs

//! Hardcoded resolutions for codepoint collisions.
//!
//! Patch sets sometimes overlap: a later set fills a gap in an earlier one,
//! or the other way around. Each known case is listed here; anything not
//! listed is an overlap error and has to be reviewed by hand.

use glyphrules_core::Codepoint;

/// Where a collision was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Situation {
    /// A later patch set assigns a codepoint an earlier one already holds
    PatchSetMerge,
    /// A codepoint is a member of more than one scale group
    ScaleGroupMembership,
}

/// What to do with the later claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapPolicy {
    KeepEarlier,
    Overwrite,
}

#[derive(Debug, Clone, Copy)]
enum Subject {
    PatchSet(&'static str),
    Any,
}

impl Subject {
    fn matches(&self, patch_set: &str) -> bool {
        match self {
            Self::PatchSet(name) => *name == patch_set,
            Self::Any => true,
        }
    }
}

const POLICIES: &[(Subject, Situation, OverlapPolicy)] = &[
    // the Font Awesome range has a gap matching the preceding Progress Indicators range
    (
        Subject::PatchSet("Font Awesome"),
        Situation::PatchSetMerge,
        OverlapPolicy::KeepEarlier,
    ),
    // the fourth Octicons range overlaps the first
    (
        Subject::PatchSet("Octicons"),
        Situation::PatchSetMerge,
        OverlapPolicy::Overwrite,
    ),
    (
        Subject::Any,
        Situation::ScaleGroupMembership,
        OverlapPolicy::KeepEarlier,
    ),
];

/// Policy for `patch_set` in `situation`; `None` means the overlap is an error.
pub fn overlap_policy(patch_set: &str, situation: Situation) -> Option<OverlapPolicy> {
    POLICIES
        .iter()
        .find(|(subject, s, _)| *s == situation && subject.matches(patch_set))
        .map(|(_, _, policy)| *policy)
}

/// Origin codepoints whose glyph is absent from the destination font but
/// whose vertical extent still belongs to their scale group.
const STAND_INS: &[(&str, Codepoint, Codepoint)] = &[
    // sort caret pair; the combined glyph is not shipped
    ("Font Awesome", 0xf0dc, 0xf0dd),
];

/// Destination codepoint whose outline stands in for `origin`.
pub fn stand_in(patch_set: &str, origin: Codepoint) -> Option<Codepoint> {
    STAND_INS
        .iter()
        .find(|(name, cp, _)| *name == patch_set && *cp == origin)
        .map(|(_, _, dest)| *dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_merge_policies() {
        assert_eq!(
            overlap_policy("Font Awesome", Situation::PatchSetMerge),
            Some(OverlapPolicy::KeepEarlier)
        );
        assert_eq!(
            overlap_policy("Octicons", Situation::PatchSetMerge),
            Some(OverlapPolicy::Overwrite)
        );
        assert_eq!(overlap_policy("Codicons", Situation::PatchSetMerge), None);
    }

    #[test]
    fn scale_groups_keep_first_membership_for_everyone() {
        for name in ["Font Awesome", "Codicons", ""] {
            assert_eq!(
                overlap_policy(name, Situation::ScaleGroupMembership),
                Some(OverlapPolicy::KeepEarlier)
            );
        }
    }

    #[test]
    fn stand_in_is_scoped_to_its_patch_set() {
        assert_eq!(stand_in("Font Awesome", 0xf0dc), Some(0xf0dd));
        assert_eq!(stand_in("Font Awesome", 0xf0dd), None);
        assert_eq!(stand_in("Octicons", 0xf0dc), None);
    }
}
