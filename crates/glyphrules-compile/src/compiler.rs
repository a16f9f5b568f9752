// this_file: crates/glyphrules-compile/src/compiler.rs

//! Attribute merging and rule table compilation.

use crate::constraint::{ConstraintRecord, Fingerprint};
use crate::crosswalk::Crosswalk;
use crate::policy::{overlap_policy, OverlapPolicy, Situation};
use crate::resolver::{ResolverStats, ScaleGroupResolver};
use glyphrules_core::{
    coalesce_codepoints, AttributeEntry, Codepoint, CodepointRange, Error, FontAccess,
    PatchSetDescriptor, Result,
};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// One emitted rule: the codepoints sharing a constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Sorted, disjoint, minimal inclusive ranges
    pub ranges: Vec<CodepointRange>,
    pub constraint: ConstraintRecord,
}

impl Rule {
    pub fn first_codepoint(&self) -> Option<Codepoint> {
        self.ranges.first().map(|r| r.start)
    }

    pub fn contains(&self, cp: Codepoint) -> bool {
        self.ranges.iter().any(|r| r.contains(cp))
    }
}

/// Rules ordered by their first codepoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table, ordering `rules` by their first codepoint.
    pub fn from_rules(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| rule.first_codepoint());
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Constraint for `cp`, if any rule covers it.
    pub fn lookup(&self, cp: Codepoint) -> Option<&ConstraintRecord> {
        self.rules
            .iter()
            .find(|rule| rule.contains(cp))
            .map(|rule| &rule.constraint)
    }
}

/// Merges per-patch-set attributes in declaration order.
pub struct AttributeCompiler<'a> {
    resolver: ScaleGroupResolver<'a>,
    entries: BTreeMap<Codepoint, AttributeEntry>,
    owners: HashMap<Codepoint, String>,
    stats: ResolverStats,
}

impl<'a> AttributeCompiler<'a> {
    pub fn new(font: &'a dyn FontAccess) -> Self {
        Self {
            resolver: ScaleGroupResolver::new(font),
            entries: BTreeMap::new(),
            owners: HashMap::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Attribute copies for the destination codepoints this patch set may claim.
    pub fn collect(
        &self,
        descriptor: &PatchSetDescriptor,
        crosswalk: &Crosswalk,
    ) -> Result<BTreeMap<Codepoint, AttributeEntry>> {
        let mut collected = BTreeMap::new();
        for &(origin, dest) in crosswalk.pairs() {
            if let Some(owner) = self.owners.get(&dest) {
                match overlap_policy(&descriptor.name, Situation::PatchSetMerge) {
                    Some(OverlapPolicy::KeepEarlier) => {
                        info!(
                            target: "glyphrules::compile",
                            "'{}': not overwriting {dest:#x} from '{owner}'",
                            descriptor.name
                        );
                        continue;
                    }
                    Some(OverlapPolicy::Overwrite) => {
                        info!(
                            target: "glyphrules::compile",
                            "'{}': overwriting {dest:#x} from '{owner}'",
                            descriptor.name
                        );
                    }
                    None => {
                        return Err(Error::Overlap {
                            patch_set: descriptor.name.clone(),
                            codepoint: dest,
                        })
                    }
                }
            }
            // attribute overrides are keyed by origin codepoint
            collected.insert(dest, descriptor.attributes.for_codepoint(origin).clone());
        }
        Ok(collected)
    }

    /// Collect, apply scale-group geometry and merge one patch set.
    pub fn add_patch_set(
        &mut self,
        descriptor: &PatchSetDescriptor,
        crosswalk: &Crosswalk,
    ) -> Result<()> {
        info!(
            target: "glyphrules::compile",
            "Extracting rules from patch set '{}'",
            descriptor.name
        );
        let mut collected = self.collect(descriptor, crosswalk)?;
        let stats = self.resolver.apply(descriptor, crosswalk, &mut collected)?;
        self.stats.groups += stats.groups;
        self.stats.assigned += stats.assigned;
        self.merge(&descriptor.name, collected);
        Ok(())
    }

    /// Merge collected entries, replacing any earlier owner.
    pub fn merge(&mut self, patch_set: &str, collected: BTreeMap<Codepoint, AttributeEntry>) {
        for (cp, entry) in collected {
            self.owners.insert(cp, patch_set.to_string());
            self.entries.insert(cp, entry);
        }
    }

    pub fn entries(&self) -> &BTreeMap<Codepoint, AttributeEntry> {
        &self.entries
    }

    /// Scale-group counters accumulated so far.
    pub fn resolver_stats(&self) -> ResolverStats {
        self.stats
    }

    /// Canonicalize, group identical constraints and coalesce their codepoints.
    pub fn compile(&self) -> RuleTable {
        let mut groups: BTreeMap<Fingerprint, (ConstraintRecord, Vec<Codepoint>)> = BTreeMap::new();
        for (&cp, entry) in &self.entries {
            let constraint = ConstraintRecord::from_entry(entry);
            groups
                .entry(constraint.fingerprint())
                .or_insert_with(|| {
                    if constraint.size.is_none() {
                        warn!(
                            target: "glyphrules::compile",
                            "Unknown stretch rule '{}' at {cp:#x}",
                            entry.stretch
                        );
                    }
                    (constraint, Vec::new())
                })
                .1
                .push(cp);
        }

        let rules: Vec<Rule> = groups
            .into_values()
            .map(|(constraint, codepoints)| Rule {
                ranges: coalesce_codepoints(&codepoints),
                constraint,
            })
            .collect();
        debug!(
            target: "glyphrules::compile",
            "{} codepoints compiled into {} rules",
            self.entries.len(),
            rules.len()
        );
        RuleTable::from_rules(rules)
    }
}
