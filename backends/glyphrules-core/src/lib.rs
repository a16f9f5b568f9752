// this_file: backends/glyphrules-core/src/lib.rs

//! Core traits and types for the glyphrules constraint compiler.

pub mod diagnostics;
pub mod error;
pub mod test_support;
pub mod traits;
pub mod types;
pub mod utils;

pub use diagnostics::RunDiagnostics;
pub use error::Error;
pub use traits::{FontAccess, FontFetcher, OriginFonts};
pub use types::{
    Align, AttributeEntry, BoundingBox, Codepoint, PatchSetAttributes, PatchSetDescriptor,
    ScaleGroup, ScaleRules,
};
pub use utils::{coalesce_codepoints, CodepointRange};

/// Result type for glyphrules operations
pub type Result<T> = std::result::Result<T, Error>;
