// this_file: crates/glyphrules-compile/src/pipeline.rs

//! The full compilation run: extract, map, resolve, compile.

use crate::compiler::{AttributeCompiler, RuleTable};
use crate::mapper::CodepointMapper;
use crate::store::CrosswalkStore;
use glyphrules_core::{FontAccess, OriginFonts, Result, RunDiagnostics};
use glyphrules_extract::{extract, ExtractOptions};
use log::info;

/// Output of one run.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    /// Patcher version the table was compiled from
    pub version: String,
    pub table: RuleTable,
    pub diagnostics: RunDiagnostics,
}

/// Compile `source` against the `destination` font.
///
/// The crosswalk store is only written after every stage succeeded.
pub fn compile_rules(
    source: &str,
    options: &ExtractOptions,
    destination: &dyn FontAccess,
    origins: &mut dyn OriginFonts,
    store: &mut dyn CrosswalkStore,
) -> Result<CompiledRules> {
    let extraction = extract(source, options)?;
    let version = extraction.version;
    let descriptors = extraction.descriptors;
    info!(
        target: "glyphrules::pipeline",
        "patcher version {version}, {} enabled patch sets",
        descriptors.len()
    );

    let previous = store.load()?;
    let mapping = CodepointMapper::new(destination, origins).map_all(
        &version,
        &descriptors,
        previous.as_ref(),
    )?;

    let mut compiler = AttributeCompiler::new(destination);
    for (descriptor, crosswalk) in descriptors.iter().zip(&mapping.crosswalks) {
        compiler.add_patch_set(descriptor, crosswalk)?;
    }
    let table = compiler.compile();

    if let Some(snapshot) = &mapping.snapshot {
        store.save(snapshot)?;
        info!(target: "glyphrules::pipeline", "crosswalk cache updated");
    }

    let resolved = compiler.resolver_stats();
    let diagnostics = RunDiagnostics {
        patch_sets: descriptors.len(),
        reused_crosswalks: mapping.reused,
        computed_crosswalks: mapping.computed,
        mapped_codepoints: mapping.crosswalks.iter().map(|c| c.len()).sum(),
        scale_groups: resolved.groups,
        grouped_codepoints: resolved.assigned,
        codepoints: compiler.entries().len(),
        rules: table.len(),
    };
    diagnostics.log(&version);

    Ok(CompiledRules {
        version,
        table,
        diagnostics,
    })
}
