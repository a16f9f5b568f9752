// this_file: backends/glyphrules-core/src/error.rs

//! Error types for glyphrules.
//!
//! Every variant is fatal for the run. Conditions that only exclude a single
//! codepoint from a stage are logged instead of being returned.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for glyphrules operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The patcher source could not be parsed
    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// The top-level version declaration is missing
    #[error("No top-level version declaration found in the patcher source")]
    MissingVersion,

    /// A descriptor is malformed or one of its values cannot be evaluated
    #[error("Invalid patch set '{patch_set}': {reason}")]
    Config { patch_set: String, reason: String },

    /// The patch sets and the destination font disagree
    #[error("Mapping error in patch set '{patch_set}': {reason}")]
    Mapping { patch_set: String, reason: String },

    /// A scale group has a degenerate bounding box
    #[error("Degenerate scale group #{group} in patch set '{patch_set}': {reason}")]
    Geometry {
        patch_set: String,
        group: usize,
        reason: String,
    },

    /// Two patch sets claim a codepoint and no policy covers the case
    #[error("Unknown case of overlap for codepoint {codepoint:#x} in patch set '{patch_set}'")]
    Overlap { patch_set: String, codepoint: u32 },

    /// An origin font could not be fetched
    #[error("Failed to fetch origin font '{filename}' (version {version}): {reason}")]
    Fetch {
        filename: String,
        version: String,
        reason: String,
    },

    /// Font file not found at specified path
    #[error("Font file not found: {path}")]
    FontNotFound { path: PathBuf },

    /// Invalid font format or corrupted font file
    #[error("Invalid font file at {path}: {reason}")]
    InvalidFont { path: PathBuf, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub fn config(patch_set: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            patch_set: patch_set.into(),
            reason: reason.into(),
        }
    }

    pub fn mapping(patch_set: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Mapping {
            patch_set: patch_set.into(),
            reason: reason.into(),
        }
    }

    pub fn geometry(patch_set: impl Into<String>, group: usize, reason: impl Into<String>) -> Self {
        Self::Geometry {
            patch_set: patch_set.into(),
            group,
            reason: reason.into(),
        }
    }

    pub fn fetch(
        filename: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            filename: filename.into(),
            version: version.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_overlap_uses_hex() {
        let err = Error::Overlap {
            patch_set: "Codicons".to_string(),
            codepoint: 0xea60,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xea60"));
        assert!(msg.contains("Codicons"));
    }

    #[test]
    fn test_error_display_fetch() {
        let err = Error::fetch("font-awesome/FontAwesome.otf", "3.4.0", "not found");
        let msg = err.to_string();
        assert!(msg.contains("font-awesome/FontAwesome.otf"));
        assert!(msg.contains("3.4.0"));
    }
}
