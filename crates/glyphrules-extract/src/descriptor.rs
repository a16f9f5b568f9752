// this_file: crates/glyphrules-extract/src/descriptor.rs

//! Conversion of candidate patch-set dict displays into descriptors.

use crate::ast::{DictItem, Expr};
use crate::eval::{literal_eval, EvalError, Evaluator};
use crate::value::Value;
use crate::ExtractOptions;
use glyphrules_core::{
    Align, AttributeEntry, Codepoint, Error, PatchSetAttributes, PatchSetDescriptor, Result,
    ScaleGroup, ScaleRules,
};
use log::{debug, trace};
use std::collections::BTreeMap;

const MAX_CODEPOINT: i64 = 0x10_FFFF;

/// Builds descriptors against the symbol table of `setup_patch_set`.
pub(crate) struct DescriptorBuilder<'a> {
    symbols: &'a BTreeMap<String, Expr>,
    options: &'a ExtractOptions,
}

impl<'a> DescriptorBuilder<'a> {
    pub(crate) fn new(symbols: &'a BTreeMap<String, Expr>, options: &'a ExtractOptions) -> Self {
        Self { symbols, options }
    }

    /// Resolve a value expression: bound names are substituted, then the
    /// result is evaluated.
    fn resolve(&self, expr: &Expr) -> std::result::Result<Value, EvalError> {
        let bound = match expr {
            Expr::Name(name) => self.symbols.get(name).unwrap_or(expr),
            _ => expr,
        };
        self.evaluate(bound)
    }

    /// Literal evaluation first, the restricted evaluator second.
    fn evaluate(&self, expr: &Expr) -> std::result::Result<Value, EvalError> {
        literal_eval(expr).or_else(|literal_err| {
            trace!(
                target: "glyphrules::extract",
                "literal evaluation failed ({literal_err}), using restricted evaluator"
            );
            Evaluator::new(&self.options.flags).eval(expr)
        })
    }

    /// Build the descriptor for the `index`-th dict display of the table.
    ///
    /// Returns `Ok(None)` when the patch set is disabled.
    pub(crate) fn build(
        &self,
        index: usize,
        items: &[DictItem],
    ) -> Result<Option<PatchSetDescriptor>> {
        let label = display_name(index, items);
        let mut values: BTreeMap<String, Value> = BTreeMap::new();

        for item in items {
            let (key, value) = match item {
                DictItem::Pair(Expr::Str(key), value) => (key, value),
                DictItem::Pair(other, _) => {
                    trace!(target: "glyphrules::extract", "{label}: skipping non-string key {other:?}");
                    continue;
                }
                DictItem::Unpack(_) => {
                    debug!(target: "glyphrules::extract", "{label}: skipping mapping unpack");
                    continue;
                }
            };
            if self.options.ignored_keys.contains(key) {
                trace!(target: "glyphrules::extract", "{label}: ignoring key '{key}'");
                continue;
            }
            // `Enabled` names flags rather than local bindings, so it is
            // evaluated without symbol substitution.
            let resolved = if key == "Enabled" {
                self.evaluate(value)
            } else {
                self.resolve(value)
            }
            .map_err(|err| Error::config(&label, format!("cannot evaluate key '{key}': {err}")))?;
            if key == "Enabled" {
                if !resolved.truthy() {
                    debug!(target: "glyphrules::extract", "{label}: disabled");
                    return Ok(None);
                }
                continue;
            }
            values.insert(key.clone(), resolved);
        }

        convert(&label, &values).map(Some)
    }
}

/// Name used in diagnostics before the descriptor is validated.
fn display_name(index: usize, items: &[DictItem]) -> String {
    items
        .iter()
        .find_map(|item| match item {
            DictItem::Pair(Expr::Str(key), Expr::Str(name)) if key == "Name" => {
                Some(name.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| format!("#{index}"))
}

fn convert(label: &str, values: &BTreeMap<String, Value>) -> Result<PatchSetDescriptor> {
    let required = |key: &str| {
        values
            .get(key)
            .ok_or_else(|| Error::config(label, format!("missing key '{key}'")))
    };

    let name = required("Name")?
        .as_str()
        .ok_or_else(|| Error::config(label, "'Name' must be a string"))?
        .to_string();
    let source_filename = required("Filename")?
        .as_str()
        .ok_or_else(|| Error::config(label, "'Filename' must be a string"))?
        .to_string();
    let sym_start = codepoint(label, "SymStart", required("SymStart")?)?;
    let sym_end = codepoint(label, "SymEnd", required("SymEnd")?)?;
    if sym_start > sym_end {
        return Err(Error::config(
            label,
            format!("SymStart {sym_start:#x} is after SymEnd {sym_end:#x}"),
        ));
    }

    let src_start = match values.get("SrcStart") {
        None | Some(Value::None) => None,
        Some(value) => Some(codepoint(label, "SrcStart", value)?),
    };
    let exact = match values.get("Exact") {
        Some(value) => value.truthy(),
        None => src_start.is_none(),
    };
    match (exact, src_start) {
        (true, Some(start)) => {
            return Err(Error::config(
                label,
                format!("exact mapping must not set SrcStart (got {start:#x})"),
            ))
        }
        (false, None) => return Err(Error::config(label, "packed mapping requires SrcStart")),
        _ => {}
    }

    let scale_rules = match values.get("ScaleRules") {
        None | Some(Value::None) => None,
        Some(value) => Some(scale_rules(label, value)?),
    };
    let attributes = attributes(label, required("Attributes")?)?;

    Ok(PatchSetDescriptor {
        name,
        source_filename,
        exact,
        sym_start,
        sym_end,
        src_start,
        scale_rules,
        attributes,
    })
}

fn codepoint(label: &str, key: &str, value: &Value) -> Result<Codepoint> {
    match value.as_i64() {
        Some(n) if (0..=MAX_CODEPOINT).contains(&n) && !matches!(value, Value::Bool(_)) => {
            Codepoint::try_from(n).map_err(|e| Error::config(label, format!("'{key}': {e}")))
        }
        _ => Err(Error::config(
            label,
            format!("'{key}' must be a codepoint, got {value}"),
        )),
    }
}

fn scale_rules(label: &str, value: &Value) -> Result<ScaleRules> {
    if !matches!(value, Value::Dict(_)) {
        return Err(Error::config(label, format!("ScaleRules must be a dict, got {value}")));
    }
    let groups_value = value
        .dict_get(&Value::Str("ScaleGroups".into()))
        .ok_or_else(|| Error::config(label, format!("scale rule format {value} not implemented")))?;
    let groups_list = match groups_value {
        Value::List(items) | Value::Tuple(items) => items,
        other => {
            return Err(Error::config(
                label,
                format!("ScaleGroups must be a list, got {other}"),
            ))
        }
    };

    let mut groups = Vec::with_capacity(groups_list.len());
    for group in groups_list {
        let parsed = match group {
            Value::Range {
                start,
                stop,
                step: 1,
            } => ScaleGroup::Range {
                start: codepoint(label, "ScaleGroups", &Value::Int(*start))?,
                stop: codepoint(label, "ScaleGroups", &Value::Int((*stop).max(*start)))?,
            },
            other => {
                let items = other.iter_items().ok_or_else(|| {
                    Error::config(label, format!("scale group must be iterable, got {other}"))
                })?;
                let cps = items
                    .iter()
                    .map(|cp| codepoint(label, "ScaleGroups", cp))
                    .collect::<Result<Vec<_>>>()?;
                ScaleGroup::List(cps)
            }
        };
        groups.push(parsed);
    }

    let shift_mode = match value.dict_get(&Value::Str("ShiftMode".into())) {
        None | Some(Value::None) => None,
        Some(Value::Str(mode)) => Some(mode.clone()),
        Some(other) => {
            return Err(Error::config(
                label,
                format!("ShiftMode must be a string, got {other}"),
            ))
        }
    };
    Ok(ScaleRules { groups, shift_mode })
}

fn attributes(label: &str, value: &Value) -> Result<PatchSetAttributes> {
    let Value::Dict(pairs) = value else {
        return Err(Error::config(label, format!("Attributes must be a dict, got {value}")));
    };
    let mut default = None;
    let mut overrides = BTreeMap::new();
    for (key, entry) in pairs {
        let parsed = attribute_entry(label, entry)?;
        match key {
            Value::Str(s) if s == "default" => default = Some(parsed),
            Value::Int(_) => {
                overrides.insert(codepoint(label, "Attributes", key)?, parsed);
            }
            other => {
                return Err(Error::config(
                    label,
                    format!("attribute key must be 'default' or a codepoint, got {other}"),
                ))
            }
        }
    }
    let default =
        default.ok_or_else(|| Error::config(label, "Attributes has no 'default' entry"))?;
    Ok(PatchSetAttributes { default, overrides })
}

fn string_field(label: &str, entry: &Value, key: &str) -> Result<String> {
    match entry.dict_get(&Value::Str(key.into())) {
        None | Some(Value::None) => Ok(String::new()),
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(Error::config(
            label,
            format!("attribute '{key}' must be a string, got {other}"),
        )),
    }
}

fn number_param(label: &str, params: Option<&Value>, key: &str, default: f64) -> Result<f64> {
    match params.and_then(|p| p.dict_get(&Value::Str(key.into()))) {
        None => Ok(default),
        Some(value) => value.as_f64().ok_or_else(|| {
            Error::config(label, format!("param '{key}' must be numeric, got {value}"))
        }),
    }
}

fn attribute_entry(label: &str, entry: &Value) -> Result<AttributeEntry> {
    if !matches!(entry, Value::Dict(_)) {
        return Err(Error::config(
            label,
            format!("attribute entry must be a dict, got {entry}"),
        ));
    }
    let params = entry.dict_get(&Value::Str("params".into()));
    if let Some(p) = params {
        if !matches!(p, Value::Dict(_)) {
            return Err(Error::config(label, format!("params must be a dict, got {p}")));
        }
    }

    let overlap = number_param(label, params, "overlap", 0.0)?;
    let y_padding = number_param(label, params, "ypadding", 0.0)?;
    if overlap != 0.0 && y_padding != 0.0 {
        return Err(Error::config(
            label,
            format!("overlap ({overlap}) and ypadding ({y_padding}) are mutually exclusive"),
        ));
    }

    Ok(AttributeEntry {
        align: Align::from_letter(&string_field(label, entry, "align")?),
        valign: Align::from_letter(&string_field(label, entry, "valign")?),
        stretch: string_field(label, entry, "stretch")?,
        overlap,
        xy_ratio: number_param(label, params, "xy-ratio", -1.0)?,
        y_padding,
        ..AttributeEntry::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::logical_lines;
    use crate::parser::parse_expression;
    use approx::assert_relative_eq;

    fn dict_items(src: &str) -> Vec<DictItem> {
        let lines = logical_lines(src).unwrap();
        match parse_expression(&lines[0].tokens).unwrap() {
            Expr::Dict(items) => items,
            other => panic!("not a dict: {other:?}"),
        }
    }

    fn build_with(
        symbols: &BTreeMap<String, Expr>,
        options: &ExtractOptions,
        src: &str,
    ) -> Result<Option<PatchSetDescriptor>> {
        DescriptorBuilder::new(symbols, options).build(0, &dict_items(src))
    }

    fn build(src: &str) -> Result<Option<PatchSetDescriptor>> {
        build_with(&BTreeMap::new(), &ExtractOptions::default(), src)
    }

    const ATTRS: &str = "{'default': {'align': 'c', 'valign': 'c', 'stretch': 'pa', 'params': {}}}";

    #[test]
    fn builds_packed_descriptor() {
        let src = format!(
            "{{'Enabled': True, 'Name': 'Seti-UI + Custom', 'Filename': 'original-source.otf', \
             'Exact': False, 'SymStart': 0xE4FA, 'SymEnd': 0xE5FF, 'SrcStart': 0xE5FA, \
             'ScaleRules': None, 'Attributes': {ATTRS}}}"
        );
        let d = build(&src).unwrap().unwrap();
        assert_eq!(d.name, "Seti-UI + Custom");
        assert!(!d.exact);
        assert_eq!(d.src_start, Some(0xE5FA));
        assert_eq!(d.span(), 0xE4FA..=0xE5FF);
        assert_eq!(d.attributes.default.align, Some(Align::Center));
        assert_eq!(d.attributes.default.stretch, "pa");
    }

    #[test]
    fn disabled_descriptor_is_dropped() {
        let src = format!(
            "{{'Enabled': self.args.careful, 'Name': 'X', 'Filename': 'x.ttf', \
             'SymStart': 1, 'SymEnd': 2, 'SrcStart': None, 'Attributes': {ATTRS}}}"
        );
        assert!(build(&src).unwrap().is_none());
    }

    #[test]
    fn enabled_ignores_local_bindings() {
        let mut symbols = BTreeMap::new();
        symbols.insert("box_enabled".to_string(), Expr::Bool(true));
        let src = format!(
            "{{'Enabled': box_enabled, 'Name': 'Box', 'Filename': 'x.ttf', \
             'SymStart': 1, 'SymEnd': 2, 'SrcStart': None, 'Attributes': {ATTRS}}}"
        );
        let built = build_with(&symbols, &ExtractOptions::default(), &src).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn exact_is_derived_from_src_start() {
        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'SymStart': 1, 'SymEnd': 2, \
             'SrcStart': None, 'Attributes': {ATTRS}}}"
        );
        assert!(build(&src).unwrap().unwrap().exact);

        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'SymStart': 0x10, 'SymEnd': 0x12, \
             'SrcStart': 0xF400, 'Attributes': {ATTRS}}}"
        );
        let packed = build(&src).unwrap().unwrap();
        assert!(!packed.exact);
        assert_eq!(packed.src_start, Some(0xF400));
    }

    #[test]
    fn rejects_inconsistent_mapping_mode() {
        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'Exact': True, 'SymStart': 1, 'SymEnd': 2, \
             'SrcStart': 5, 'Attributes': {ATTRS}}}"
        );
        assert!(matches!(build(&src), Err(Error::Config { .. })));
        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'Exact': False, 'SymStart': 1, 'SymEnd': 2, \
             'SrcStart': None, 'Attributes': {ATTRS}}}"
        );
        assert!(matches!(build(&src), Err(Error::Config { .. })));
    }

    #[test]
    fn substitutes_bound_symbols() {
        let mut symbols = BTreeMap::new();
        let attrs = logical_lines(
            "{'default': {'align': 'l', 'valign': 'c', 'stretch': '^xy', \
             'params': {'overlap': 0.7 if not self.args.careful else 0.5, 'xy-ratio': 0.7}}, \
             0xe0b4: {'align': 'r', 'valign': '', 'stretch': 'xy', 'params': {'careful': True}}}",
        )
        .unwrap();
        symbols.insert(
            "SYM_ATTR_POWERLINE".to_string(),
            parse_expression(&attrs[0].tokens).unwrap(),
        );
        let src = "{'Name': 'Powerline', 'Filename': 'powerline.otf', 'SymStart': 0xe0b0, \
                   'SymEnd': 0xe0b4, 'SrcStart': None, 'Attributes': SYM_ATTR_POWERLINE}";
        let d = build_with(&symbols, &ExtractOptions::default(), src)
            .unwrap()
            .unwrap();
        assert_relative_eq!(d.attributes.default.overlap, 0.7);
        assert_relative_eq!(d.attributes.default.xy_ratio, 0.7);
        let arc = d.attributes.for_codepoint(0xe0b4);
        assert_eq!(arc.align, Some(Align::End));
        assert_eq!(arc.valign, None);
        assert_relative_eq!(arc.xy_ratio, -1.0);
    }

    #[test]
    fn unresolvable_value_names_patch_set_and_key() {
        let src = format!(
            "{{'Name': 'Broken', 'Filename': 'x.ttf', 'SymStart': NOT_BOUND, 'SymEnd': 2, \
             'SrcStart': None, 'Attributes': {ATTRS}}}"
        );
        let err = build(&src).unwrap_err().to_string();
        assert!(err.contains("Broken"));
        assert!(err.contains("SymStart"));
    }

    #[test]
    fn denylisted_keys_are_skipped() {
        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'Exact': open('boom'), 'SymStart': 1, \
             'SymEnd': 2, 'SrcStart': None, 'Attributes': {ATTRS}}}"
        );
        assert!(build(&src).is_err());
        let options = ExtractOptions::default().ignore_key("Exact");
        let d = build_with(&BTreeMap::new(), &options, &src).unwrap().unwrap();
        assert!(d.exact);
    }

    #[test]
    fn parses_scale_groups() {
        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'SymStart': 1, 'SymEnd': 2, 'SrcStart': None, \
             'ScaleRules': {{'ScaleGroups': [[0xf0dc, 0xf0dd], range(0xf100, 0xf104), \
             range(0, 6, 2)], 'ShiftMode': 'x'}}, 'Attributes': {ATTRS}}}"
        );
        let d = build(&src).unwrap().unwrap();
        let rules = d.scale_rules.unwrap();
        assert_eq!(
            rules.groups,
            vec![
                ScaleGroup::List(vec![0xf0dc, 0xf0dd]),
                ScaleGroup::Range {
                    start: 0xf100,
                    stop: 0xf104
                },
                ScaleGroup::List(vec![0, 2, 4]),
            ]
        );
        assert_eq!(rules.shift_mode.as_deref(), Some("x"));
    }

    #[test]
    fn scale_rules_without_groups_are_rejected() {
        let src = format!(
            "{{'Name': 'X', 'Filename': 'x.ttf', 'SymStart': 1, 'SymEnd': 2, 'SrcStart': None, \
             'ScaleRules': {{'ScaleGlyph': 0xf000}}, 'Attributes': {ATTRS}}}"
        );
        let err = build(&src).unwrap_err().to_string();
        assert!(err.contains("not implemented"));
    }

    #[test]
    fn attributes_require_default() {
        let src = "{'Name': 'X', 'Filename': 'x.ttf', 'SymStart': 1, 'SymEnd': 2, \
                   'SrcStart': None, 'Attributes': {0x1: {'stretch': 'pa'}}}";
        let err = build(src).unwrap_err().to_string();
        assert!(err.contains("default"));
    }

    #[test]
    fn overlap_and_padding_are_exclusive() {
        let src = "{'Name': 'X', 'Filename': 'x.ttf', 'SymStart': 1, 'SymEnd': 2, \
                   'SrcStart': None, 'Attributes': {'default': {'stretch': 'pa', \
                   'params': {'overlap': 0.02, 'ypadding': 0.3}}}}";
        assert!(matches!(build(src), Err(Error::Config { .. })));
    }
}
