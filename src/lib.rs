// this_file: src/lib.rs

//! glyphrules: compile Nerd Fonts patch-set rules into a constraint table.
//!
//! [`run`] reads the vendored `font-patcher`, maps every enabled patch set
//! into the destination font and writes the Zig constraint switch.

pub mod layout;

pub use glyphrules_compile::{compile_rules, CompiledRules, RuleTable, ZigRenderer};
pub use glyphrules_core::{Error, Result};
pub use layout::{CodegenOptions, ProjectLayout};

use camino::Utf8Path;
use glyphrules_compile::{CrosswalkStore, JsonFileStore, MemoryStore};
use glyphrules_ttf::{CachedOriginFonts, FontLoader};
use log::info;

/// Run the whole generation for one destination font.
///
/// Nothing is written when any stage fails.
pub fn run(layout: &ProjectLayout, options: &CodegenOptions) -> Result<CompiledRules> {
    let source = read_source(&layout.patcher_source())?;
    let font = FontLoader::default().load(&options.font)?;
    info!(
        target: "glyphrules::pipeline",
        "destination font {} ({} glyphs)",
        options.font,
        font.glyph_count()
    );

    let fetcher = options.fetcher(layout);
    let mut origins = if options.use_cache {
        CachedOriginFonts::new(layout.font_cache(), fetcher)
    } else {
        CachedOriginFonts::uncached(fetcher)
    };
    let mut store: Box<dyn CrosswalkStore> = if options.use_cache {
        Box::new(JsonFileStore::new(layout.crosswalk_cache()))
    } else {
        Box::new(MemoryStore::new())
    };

    let compiled = compile_rules(
        &source,
        &options.extract,
        &*font,
        &mut origins,
        store.as_mut(),
    )?;

    let output = options.output_path(layout);
    ZigRenderer::default().write(&compiled.table, &output)?;
    info!(
        target: "glyphrules::pipeline",
        "wrote {} rules for patcher {} to {output}",
        compiled.table.len(),
        compiled.version
    );
    Ok(compiled)
}

fn read_source(path: &Utf8Path) -> Result<String> {
    std::fs::read_to_string(path.as_std_path())
        .map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{path}: {e}"))))
}
