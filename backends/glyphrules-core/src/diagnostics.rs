// this_file: backends/glyphrules-core/src/diagnostics.rs

//! Run diagnostics used by the pipeline for structured debug logging.

use log::{debug, log_enabled, Level};

/// Per-stage counters collected during one compilation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunDiagnostics {
    /// Enabled patch sets extracted from the source
    pub patch_sets: usize,
    /// Crosswalks taken from the versioned cache
    pub reused_crosswalks: usize,
    /// Crosswalks recomputed from fonts
    pub computed_crosswalks: usize,
    /// Origin to destination pairs across all crosswalks
    pub mapped_codepoints: usize,
    /// Scale groups that contributed geometry
    pub scale_groups: usize,
    /// Codepoints that received group-relative geometry
    pub grouped_codepoints: usize,
    /// Codepoints in the merged attribute map
    pub codepoints: usize,
    /// Rules in the emitted table
    pub rules: usize,
}

impl RunDiagnostics {
    /// Emit the snapshot at debug level when logging is enabled.
    pub fn log(&self, version: &str) {
        if log_enabled!(Level::Debug) {
            debug!(
                target: "glyphrules::pipeline",
                "version={version} patch_sets={patch_sets} crosswalks(reused={reused}, computed={computed}) mapped={mapped} scale_groups={groups} grouped={grouped} codepoints={codepoints} rules={rules}",
                version = version,
                patch_sets = self.patch_sets,
                reused = self.reused_crosswalks,
                computed = self.computed_crosswalks,
                mapped = self.mapped_codepoints,
                groups = self.scale_groups,
                grouped = self.grouped_codepoints,
                codepoints = self.codepoints,
                rules = self.rules,
            );
        }
    }
}
