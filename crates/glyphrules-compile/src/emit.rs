// this_file: crates/glyphrules-compile/src/emit.rs

//! Zig rendering of the rule table.

use crate::compiler::{Rule, RuleTable};
use crate::constraint::ConstraintRecord;
use camino::Utf8Path;
use glyphrules_core::utils::write_atomic;
use glyphrules_core::Result;

/// Renders a [`RuleTable`] as a `getConstraint` switch.
#[derive(Debug, Clone)]
pub struct ZigRenderer {
    generator: String,
}

impl Default for ZigRenderer {
    fn default() -> Self {
        Self::new("glyphrules")
    }
}

impl ZigRenderer {
    /// `generator` is named in the generated-file header.
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
        }
    }

    pub fn render(&self, table: &RuleTable) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "//! This is a generated file, produced by {}\n\
             //! DO NOT EDIT BY HAND!\n\
             //!\n\
             //! This file provides info extracted from the nerd fonts patcher script,\n\
             //! specifying the scaling/positioning attributes of various glyphs.\n\
             \n\
             const Constraint = @import(\"face.zig\").RenderOptions.Constraint;\n\
             \n\
             /// Get the constraints for the provided codepoint.\n\
             pub fn getConstraint(cp: u21) ?Constraint {{\n    return switch (cp) {{\n",
            self.generator
        ));
        for rule in table.rules() {
            render_rule(&mut out, rule);
        }
        out.push_str("        else => null,\n    };\n}\n");
        out
    }

    /// Render and write to `path`; the file is only replaced once fully written.
    pub fn write(&self, table: &RuleTable, path: &Utf8Path) -> Result<()> {
        write_atomic(path.as_std_path(), self.render(table).as_bytes())
    }
}

fn render_rule(out: &mut String, rule: &Rule) {
    for range in &rule.ranges {
        if range.is_single() {
            out.push_str(&format!("        {:#x},\n", range.start));
        } else {
            out.push_str(&format!("        {:#x}...{:#x},\n", range.start, range.end));
        }
    }
    out.push_str("        => .{\n");
    for (field, value) in fields(&rule.constraint) {
        out.push_str(&format!("            .{field} = {value},\n"));
    }
    out.push_str("        },\n");
}

/// Set fields in emission order.
fn fields(c: &ConstraintRecord) -> Vec<(&'static str, String)> {
    let relative = |v: f64| format!("{v:.16}");
    let plain = |v: f64| format!("{v:?}");
    [
        ("size", c.size.map(|m| format!(".{}", m.as_str()))),
        ("height", c.height.map(|m| format!(".{}", m.as_str()))),
        ("max_constraint_width", c.max_constraint_width.map(|w| w.to_string())),
        ("align_horizontal", c.align_horizontal.map(|a| format!(".{}", a.as_str()))),
        ("align_vertical", c.align_vertical.map(|a| format!(".{}", a.as_str()))),
        ("relative_width", c.relative_width.map(relative)),
        ("relative_height", c.relative_height.map(relative)),
        ("relative_x", c.relative_x.map(relative)),
        ("relative_y", c.relative_y.map(relative)),
        ("pad_left", c.pad_left.map(plain)),
        ("pad_right", c.pad_right.map(plain)),
        ("pad_top", c.pad_top.map(plain)),
        ("pad_bottom", c.pad_bottom.map(plain)),
        ("max_xy_ratio", c.max_xy_ratio.map(plain)),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect()
}
