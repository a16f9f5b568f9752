// this_file: crates/glyphrules-compile/src/lib.rs

//! From patch-set descriptors to the emitted constraint table.
//!
//! [`mapper`] builds per-patch-set crosswalks into the destination font,
//! [`resolver`] derives scale-group geometry, [`compiler`] merges and
//! compacts everything into a [`RuleTable`] and [`emit`] renders it.

pub mod compiler;
pub mod constraint;
pub mod crosswalk;
pub mod emit;
pub mod mapper;
pub mod pipeline;
pub mod policy;
pub mod resolver;
pub mod store;

pub use compiler::{AttributeCompiler, Rule, RuleTable};
pub use constraint::{ConstraintRecord, Fingerprint, HeightMode, SizeMode};
pub use crosswalk::Crosswalk;
pub use emit::ZigRenderer;
pub use mapper::{CodepointMapper, MappingOutcome};
pub use pipeline::{compile_rules, CompiledRules};
pub use policy::{overlap_policy, stand_in, OverlapPolicy, Situation};
pub use resolver::{GroupGeometry, ResolverStats, ScaleGroupResolver};
pub use store::{CrosswalkSnapshot, CrosswalkStore, JsonFileStore, MemoryStore, SnapshotEntry};
