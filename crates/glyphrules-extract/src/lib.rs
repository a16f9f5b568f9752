// this_file: crates/glyphrules-extract/src/lib.rs

//! Static extraction of patch-set descriptors from the Nerd Fonts patcher.
//!
//! The patcher source is never executed. It is tokenized and parsed into a
//! small expression tree; values are obtained by literal evaluation or, for
//! the handful of conditional expressions the patcher uses, by a closed
//! evaluator that only knows a fixed table of command-line flags.

pub mod ast;
mod descriptor;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

use ast::{Expr, Target};
use descriptor::DescriptorBuilder;
use glyphrules_core::{Error, PatchSetDescriptor, Result};
use lexer::{LexError, LogicalLine};
use log::{debug, info, trace};
use std::collections::{BTreeMap, BTreeSet};

pub use eval::FlagTable;

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::parse(err.line, err.message)
    }
}

/// Extraction options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Descriptor keys that are skipped without being evaluated
    pub ignored_keys: BTreeSet<String>,
    /// Flags visible to the restricted evaluator
    pub flags: FlagTable,
}

impl ExtractOptions {
    pub fn ignore_key(mut self, key: &str) -> Self {
        self.ignored_keys.insert(key.to_string());
        self
    }
}

/// Result of extracting a patcher source.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Patcher version declared at module level
    pub version: String,
    /// Enabled patch sets in declaration order
    pub descriptors: Vec<PatchSetDescriptor>,
}

/// Extract the version and the enabled patch sets from `source`.
pub fn extract(source: &str, options: &ExtractOptions) -> Result<Extraction> {
    let lines = lexer::logical_lines(source)?;
    let version = module_version(&lines)?;

    let class = parser::find_definition(lines.iter().enumerate(), "class", "font_patcher")
        .ok_or_else(|| Error::parse(0, "class font_patcher not found"))?;
    let class_indent = lines[class].indent;
    let class_end = lines[class + 1..]
        .iter()
        .position(|l| l.indent <= class_indent)
        .map_or(lines.len(), |offset| class + 1 + offset);
    let setup = parser::find_definition(
        lines[..class_end].iter().enumerate().skip(class + 1),
        "def",
        "setup_patch_set",
    )
    .ok_or_else(|| {
        Error::parse(
            lines[class].line,
            "font_patcher has no setup_patch_set routine",
        )
    })?;

    let body = parser::block_body(&lines, setup);
    let symbols = collect_symbols(&body);
    debug!(
        target: "glyphrules::extract",
        "setup_patch_set: {} statements, {} bound symbols",
        body.len(),
        symbols.len()
    );

    let builder = DescriptorBuilder::new(&symbols, options);
    let mut descriptors = Vec::new();
    let mut candidates = 0usize;
    for line in &body {
        let Some(assignment) = parser::split_assignment(line) else {
            continue;
        };
        let is_table = assignment.targets.iter().any(|t| {
            matches!(t, Target::Attribute(path) if path.rsplit('.').next() == Some("patch_set"))
        });
        if !is_table {
            continue;
        }
        let Expr::List(elements) = parser::parse_expression(assignment.value)? else {
            debug!(
                target: "glyphrules::extract",
                "line {}: patch_set assignment is not a list display",
                assignment.line
            );
            continue;
        };
        for element in &elements {
            let Expr::Dict(items) = element else {
                trace!(target: "glyphrules::extract", "skipping non-dict patch_set element");
                continue;
            };
            if let Some(descriptor) = builder.build(candidates, items)? {
                debug!(
                    target: "glyphrules::extract",
                    "patch set '{}' ({:#x}..={:#x}, {})",
                    descriptor.name,
                    descriptor.sym_start,
                    descriptor.sym_end,
                    if descriptor.exact { "exact" } else { "packed" }
                );
                descriptors.push(descriptor);
            }
            candidates += 1;
        }
    }

    info!(
        target: "glyphrules::extract",
        "font-patcher {version}: {} of {candidates} patch sets enabled",
        descriptors.len()
    );
    Ok(Extraction {
        version,
        descriptors,
    })
}

/// The first module-level `version = "<str>"` declaration.
fn module_version(lines: &[LogicalLine]) -> Result<String> {
    for line in lines.iter().filter(|l| l.indent == 0) {
        let Some(assignment) = parser::split_assignment(line) else {
            continue;
        };
        if !assignment
            .targets
            .iter()
            .any(|t| matches!(t, Target::Name(n) if n == "version"))
        {
            continue;
        }
        if let Ok(Expr::Str(version)) = parser::parse_expression(assignment.value) {
            return Ok(version);
        }
    }
    Err(Error::MissingVersion)
}

/// Simple single-target `NAME = expr` bindings of a routine body.
fn collect_symbols(body: &[&LogicalLine]) -> BTreeMap<String, Expr> {
    let mut symbols = BTreeMap::new();
    for line in body {
        let Some(assignment) = parser::split_assignment(line) else {
            continue;
        };
        let [Target::Name(name)] = assignment.targets.as_slice() else {
            continue;
        };
        match parser::parse_expression(assignment.value) {
            Ok(expr) => {
                symbols.insert(name.clone(), expr);
            }
            Err(err) => {
                trace!(target: "glyphrules::extract", "not binding '{name}': {err}");
            }
        }
    }
    symbols
}
