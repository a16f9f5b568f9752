// this_file: benches/compile_rules.rs

//! Extraction and table compilation benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glyphrules::{compile_rules, ZigRenderer};
use glyphrules_compile::MemoryStore;
use glyphrules_core::test_support::{MemoryFont, MemoryOriginFonts};
use glyphrules_extract::{extract, ExtractOptions};

/// A patcher excerpt with a few thousand mapped codepoints.
fn patcher_source() -> String {
    let mut patch_sets = String::new();
    for (i, start) in (0xe000u32..0xf000).step_by(0x200).enumerate() {
        let exact = if i % 2 == 0 { "True" } else { "False" };
        let src_start = if i % 2 == 0 {
            "None".to_string()
        } else {
            format!("{:#x}", start)
        };
        patch_sets.push_str(&format!(
            "            {{'Enabled': self.args.material, 'Name': \"Set {i}\", 'Filename': \"set{i}.otf\", \
             'Exact': {exact}, 'SymStart': {start:#x}, 'SymEnd': {end:#x}, 'SrcStart': {src_start}, \
             'ScaleRules': {{'ScaleGroups': [range({start:#x}, {group_end:#x})]}}, 'Attributes': ATTRS}},\n",
            end = start + 0x1ff,
            group_end = start + 0x10,
        ));
    }
    format!(
        "version = \"3.4.0\"\n\n\
         class font_patcher:\n    \
         def setup_patch_set(self):\n        \
         ATTRS = {{\n            \
         'default': {{'align': 'c', 'valign': 'c', 'stretch': 'pa', 'params': {{}}}},\n            \
         0xe001: {{'align': 'l', 'valign': 'c', 'stretch': '^xy', 'params': {{'overlap': 0.02}}}},\n        \
         }}\n        \
         self.patch_set = [\n{patch_sets}        ]\n"
    )
}

fn fonts() -> (MemoryFont, MemoryOriginFonts) {
    let destination = MemoryFont::new().with_codepoints(0xe000..0xf000);
    let mut origins = MemoryOriginFonts::new();
    for i in 0..8 {
        // every third origin glyph is missing
        let origin = MemoryFont::new().with_codepoints((0xe000..0xf000).filter(|cp| cp % 3 != 0));
        origins = origins.with_font(&format!("set{i}.otf"), origin);
    }
    (destination, origins)
}

fn bench_extract(c: &mut Criterion) {
    let source = patcher_source();
    let options = ExtractOptions::default();
    c.bench_function("extract_patch_sets", |b| {
        b.iter(|| extract(black_box(&source), &options).unwrap())
    });
}

fn bench_compile(c: &mut Criterion) {
    let source = patcher_source();
    let options = ExtractOptions::default();
    let (destination, origins) = fonts();

    c.bench_function("compile_rules_cold", |b| {
        b.iter(|| {
            let mut origins = origins.clone();
            let mut store = MemoryStore::new();
            compile_rules(black_box(&source), &options, &destination, &mut origins, &mut store)
                .unwrap()
        })
    });

    let mut warm = MemoryStore::new();
    let mut warm_origins = origins.clone();
    compile_rules(&source, &options, &destination, &mut warm_origins, &mut warm).unwrap();
    c.bench_function("compile_rules_cached", |b| {
        b.iter(|| {
            let mut store = warm.clone();
            compile_rules(black_box(&source), &options, &destination, &mut warm_origins, &mut store)
                .unwrap()
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let source = patcher_source();
    let (destination, mut origins) = fonts();
    let compiled = compile_rules(
        &source,
        &ExtractOptions::default(),
        &destination,
        &mut origins,
        &mut MemoryStore::new(),
    )
    .unwrap();
    let renderer = ZigRenderer::default();
    c.bench_function("render_zig", |b| {
        b.iter(|| renderer.render(black_box(&compiled.table)))
    });
}

criterion_group!(benches, bench_extract, bench_compile, bench_render);
criterion_main!(benches);
