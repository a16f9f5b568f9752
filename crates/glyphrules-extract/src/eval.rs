// this_file: crates/glyphrules-extract/src/eval.rs

//! Literal evaluation and the restricted expression evaluator.
//!
//! Neither evaluator has access to the filesystem, the environment or any
//! callable other than `range`. Names resolve only against a [`FlagTable`].

use crate::ast::{Arg, BinOp, BoolOp, CmpOp, DictItem, Expr, UnaryOp};
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// Longest `range(...)` the evaluator will materialize.
const MAX_RANGE_LEN: i64 = 0x11_0000;
/// Longest sequence repetition the evaluator will build.
const MAX_REPEAT_LEN: usize = 0x1_0000;

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{0}")]
pub struct EvalError(pub String);

impl EvalError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type EvalResult = std::result::Result<Value, EvalError>;

/// Command-line flags and globals visible to the restricted evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTable {
    /// Values of `self.args.<name>`
    pub args: BTreeMap<String, bool>,
    /// Values of bare global names
    pub globals: BTreeMap<String, bool>,
}

impl Default for FlagTable {
    /// Every optional glyph set enabled, careful and custom modes off, box
    /// drawing glyphs neither generated nor kept.
    fn default() -> Self {
        let enabled = [
            "fontawesome",
            "fontawesomeextension",
            "fontlogos",
            "octicons",
            "codicons",
            "powersymbols",
            "pomicons",
            "powerline",
            "powerlineextra",
            "material",
            "weather",
        ];
        let mut args: BTreeMap<String, bool> =
            enabled.iter().map(|name| (name.to_string(), true)).collect();
        args.insert("careful".to_string(), false);
        args.insert("custom".to_string(), false);

        let globals = [("box_enabled", false), ("box_keep", false)]
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self { args, globals }
    }
}

impl FlagTable {
    pub fn with_arg(mut self, name: &str, value: bool) -> Self {
        self.args.insert(name.to_string(), value);
        self
    }
}

/// Evaluate `expr` as a pure literal: constants, containers and signed numbers.
pub fn literal_eval(expr: &Expr) -> EvalResult {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::None => Ok(Value::None),
        Expr::List(items) => Ok(Value::List(literal_items(items)?)),
        Expr::Tuple(items) => Ok(Value::Tuple(literal_items(items)?)),
        Expr::Set(items) => Ok(Value::set_from_items(literal_items(items)?)),
        Expr::Dict(items) => {
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    DictItem::Pair(k, v) => pairs.push((literal_eval(k)?, literal_eval(v)?)),
                    DictItem::Unpack(_) => {
                        return Err(EvalError::new("mapping unpack is not a literal"))
                    }
                }
            }
            Ok(Value::dict_from_pairs(pairs))
        }
        Expr::Unary(op @ (UnaryOp::Neg | UnaryOp::Pos), operand) => {
            match (op, literal_eval(operand)?) {
                (UnaryOp::Neg, Value::Int(n)) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::new("integer overflow")),
                (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                (_, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
                (_, other) => Err(EvalError::new(format!(
                    "unary sign on non-numeric {}",
                    other.type_name()
                ))),
            }
        }
        other => Err(EvalError::new(format!("not a literal: {}", describe(other)))),
    }
}

fn literal_items(items: &[Expr]) -> std::result::Result<Vec<Value>, EvalError> {
    items.iter().map(literal_eval).collect()
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Name(n) => format!("name '{n}'"),
        Expr::Attribute(..) => match expr.dotted_path() {
            Some(path) => format!("attribute '{path}'"),
            None => "attribute access".to_string(),
        },
        Expr::Call(..) => "call".to_string(),
        Expr::Binary(..) => "binary operation".to_string(),
        Expr::BoolOp(..) => "boolean operation".to_string(),
        Expr::Compare(..) => "comparison".to_string(),
        Expr::IfElse { .. } => "conditional expression".to_string(),
        Expr::Subscript(..) => "subscript".to_string(),
        Expr::Unary(..) => "unary operation".to_string(),
        Expr::Ellipsis => "ellipsis".to_string(),
        _ => "expression".to_string(),
    }
}

/// Closed-grammar evaluator for the non-literal values found in patch sets.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    flags: &'a FlagTable,
}

impl<'a> Evaluator<'a> {
    pub fn new(flags: &'a FlagTable) -> Self {
        Self { flags }
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) | Expr::None => {
                literal_eval(expr)
            }
            Expr::Ellipsis => Err(EvalError::new("ellipsis is not a value")),
            Expr::Name(name) => self.name(name),
            Expr::Attribute(..) => self.attribute(expr),
            Expr::List(items) => Ok(Value::List(self.items(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.items(items)?)),
            Expr::Set(items) => Ok(Value::set_from_items(self.items(items)?)),
            Expr::Dict(items) => self.dict(items),
            Expr::Unary(op, operand) => unary(*op, self.eval(operand)?),
            Expr::Binary(op, left, right) => binary(*op, self.eval(left)?, self.eval(right)?),
            Expr::BoolOp(op, values) => self.bool_op(*op, values),
            Expr::Compare(left, rest) => self.compare(left, rest),
            Expr::IfElse { body, test, orelse } => {
                if self.eval(test)?.truthy() {
                    self.eval(body)
                } else {
                    self.eval(orelse)
                }
            }
            Expr::Call(callee, args) => self.call(callee, args),
            Expr::Subscript(base, index) => subscript(self.eval(base)?, self.eval(index)?),
        }
    }

    fn items(&self, items: &[Expr]) -> std::result::Result<Vec<Value>, EvalError> {
        items.iter().map(|item| self.eval(item)).collect()
    }

    fn name(&self, name: &str) -> EvalResult {
        self.flags
            .globals
            .get(name)
            .map(|v| Value::Bool(*v))
            .ok_or_else(|| EvalError::new(format!("name '{name}' is not defined")))
    }

    fn attribute(&self, expr: &Expr) -> EvalResult {
        let path = expr
            .dotted_path()
            .ok_or_else(|| EvalError::new("attribute access on a computed value"))?;
        let flag = path
            .strip_prefix("self.args.")
            .filter(|flag| !flag.contains('.'))
            .ok_or_else(|| EvalError::new(format!("attribute '{path}' is not available")))?;
        self.flags
            .args
            .get(flag)
            .map(|v| Value::Bool(*v))
            .ok_or_else(|| EvalError::new(format!("unknown flag 'self.args.{flag}'")))
    }

    fn dict(&self, items: &[DictItem]) -> EvalResult {
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            match item {
                DictItem::Pair(k, v) => pairs.push((self.eval(k)?, self.eval(v)?)),
                DictItem::Unpack(mapping) => match self.eval(mapping)? {
                    Value::Dict(inner) => pairs.extend(inner),
                    other => {
                        return Err(EvalError::new(format!(
                            "'{}' object is not a mapping",
                            other.type_name()
                        )))
                    }
                },
            }
        }
        Ok(Value::dict_from_pairs(pairs))
    }

    fn bool_op(&self, op: BoolOp, values: &[Expr]) -> EvalResult {
        let mut last = Value::None;
        for expr in values {
            last = self.eval(expr)?;
            let short_circuit = match op {
                BoolOp::And => !last.truthy(),
                BoolOp::Or => last.truthy(),
            };
            if short_circuit {
                break;
            }
        }
        Ok(last)
    }

    fn compare(&self, left: &Expr, rest: &[(CmpOp, Expr)]) -> EvalResult {
        let mut lhs = self.eval(left)?;
        for (op, right) in rest {
            let rhs = self.eval(right)?;
            if !compare_values(*op, &lhs, &rhs)? {
                return Ok(Value::Bool(false));
            }
            lhs = rhs;
        }
        Ok(Value::Bool(true))
    }

    fn call(&self, callee: &Expr, args: &[Arg]) -> EvalResult {
        match callee {
            Expr::Name(name) if name == "range" => {
                let mut bounds = Vec::with_capacity(args.len());
                for arg in args {
                    match arg {
                        Arg::Positional(expr) => {
                            let value = self.eval(expr)?;
                            bounds.push(value.as_i64().ok_or_else(|| {
                                EvalError::new(format!(
                                    "'{}' object cannot be interpreted as an integer",
                                    value.type_name()
                                ))
                            })?);
                        }
                        Arg::Keyword(key, _) => {
                            return Err(EvalError::new(format!(
                                "range() takes no keyword argument '{key}'"
                            )))
                        }
                    }
                }
                make_range(&bounds)
            }
            other => Err(EvalError::new(format!(
                "call of {} is not permitted",
                describe(other)
            ))),
        }
    }
}

fn make_range(bounds: &[i64]) -> EvalResult {
    let (start, stop, step) = match *bounds {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => {
            return Err(EvalError::new(format!(
                "range expected 1 to 3 arguments, got {}",
                bounds.len()
            )))
        }
    };
    if step == 0 {
        return Err(EvalError::new("range() arg 3 must not be zero"));
    }
    let span = (i128::from(stop) - i128::from(start)).abs();
    if span / i128::from(step).abs() > i128::from(MAX_RANGE_LEN) {
        return Err(EvalError::new("range is larger than the Unicode codespace"));
    }
    Ok(Value::Range { start, stop, step })
}

fn unary(op: UnaryOp, value: Value) -> EvalResult {
    let bad_operand = |value: &Value| {
        EvalError::new(format!(
            "bad operand type for unary op: '{}'",
            value.type_name()
        ))
    };
    match op {
        UnaryOp::Not => return Ok(Value::Bool(!value.truthy())),
        UnaryOp::Neg | UnaryOp::Pos => {
            if let Value::Float(f) = value {
                return Ok(Value::Float(if op == UnaryOp::Neg { -f } else { f }));
            }
        }
        UnaryOp::Invert => {}
    }
    let n = value.as_i64().ok_or_else(|| bad_operand(&value))?;
    let result = match op {
        UnaryOp::Neg => n.checked_neg(),
        UnaryOp::Invert => Some(!n),
        _ => Some(n),
    };
    result.map(Value::Int).ok_or_else(overflow)
}

fn overflow() -> EvalError {
    EvalError::new("integer overflow")
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::new(format!(
        "unsupported operand types for {op:?}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn repeat(items: &[Value], times: i64) -> std::result::Result<Vec<Value>, EvalError> {
    let times = usize::try_from(times.max(0)).map_err(|_| overflow())?;
    if items.len().saturating_mul(times) > MAX_REPEAT_LEN {
        return Err(EvalError::new("sequence repetition is too large"));
    }
    Ok(items.iter().cloned().cycle().take(items.len() * times).collect())
}

fn binary(op: BinOp, left: Value, right: Value) -> EvalResult {
    match (&left, &right) {
        (Value::Str(a), Value::Str(b)) if op == BinOp::Add => return Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) if op == BinOp::Add => {
            return Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (Value::Tuple(a), Value::Tuple(b)) if op == BinOp::Add => {
            return Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (Value::Str(s), n) | (n, Value::Str(s)) if op == BinOp::Mul && n.as_i64().is_some() => {
            let times = n.as_i64().unwrap_or(0).max(0);
            let times = usize::try_from(times).map_err(|_| overflow())?;
            if s.len().saturating_mul(times) > MAX_REPEAT_LEN {
                return Err(EvalError::new("string repetition is too large"));
            }
            return Ok(Value::Str(s.repeat(times)));
        }
        (Value::List(items), n) | (n, Value::List(items))
            if op == BinOp::Mul && n.as_i64().is_some() =>
        {
            return Ok(Value::List(repeat(items, n.as_i64().unwrap_or(0))?));
        }
        _ => {}
    }

    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return int_binary(op, a, b);
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => float_binary(op, a, b).ok_or_else(|| unsupported(op, &left, &right))?,
        _ => Err(unsupported(op, &left, &right)),
    }
}

/// Integer arithmetic with Python division and modulo semantics.
fn int_binary(op: BinOp, a: i64, b: i64) -> EvalResult {
    let zero_division = || Err(EvalError::new("division by zero"));
    let checked = |v: Option<i64>| v.map(Value::Int).ok_or_else(overflow);
    match op {
        BinOp::Add => checked(a.checked_add(b)),
        BinOp::Sub => checked(a.checked_sub(b)),
        BinOp::Mul => checked(a.checked_mul(b)),
        BinOp::Div if b == 0 => zero_division(),
        BinOp::Div => Ok(Value::Float(a as f64 / b as f64)),
        BinOp::FloorDiv | BinOp::Mod if b == 0 => zero_division(),
        BinOp::FloorDiv => {
            // euclidean division rounds toward -inf only for positive divisors
            let floor = a
                .checked_div_euclid(b)
                .zip(a.checked_rem_euclid(b))
                .map(|(q, r)| if b < 0 && r != 0 { q - 1 } else { q });
            checked(floor)
        }
        BinOp::Mod => checked(
            a.checked_rem_euclid(b)
                .map(|r| if b < 0 && r != 0 { r + b } else { r }),
        ),
        BinOp::Pow if b < 0 => Ok(Value::Float((a as f64).powf(b as f64))),
        BinOp::Pow => checked(u32::try_from(b).ok().and_then(|e| a.checked_pow(e))),
        BinOp::BitOr => Ok(Value::Int(a | b)),
        BinOp::BitXor => Ok(Value::Int(a ^ b)),
        BinOp::BitAnd => Ok(Value::Int(a & b)),
        BinOp::Shl => checked(
            u32::try_from(b)
                .ok()
                .and_then(|s| a.checked_shl(s))
                .filter(|v| v >> b.min(63) == a),
        ),
        BinOp::Shr if b < 0 => Err(EvalError::new("negative shift count")),
        BinOp::Shr => Ok(Value::Int(a >> b.min(63))),
    }
}

/// Float arithmetic; `None` when the operator does not apply to floats.
fn float_binary(op: BinOp, a: f64, b: f64) -> Option<EvalResult> {
    let zero_division = || Err(EvalError::new("float division by zero"));
    Some(match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div | BinOp::FloorDiv | BinOp::Mod if b == 0.0 => zero_division(),
        BinOp::Div => Ok(Value::Float(a / b)),
        BinOp::FloorDiv => Ok(Value::Float((a / b).floor())),
        BinOp::Mod => Ok(Value::Float(a - b * (a / b).floor())),
        BinOp::Pow => Ok(Value::Float(a.powf(b))),
        _ => return None,
    })
}

fn order(left: &Value, right: &Value) -> std::result::Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !x.py_eq(y) {
                    return order(x, y);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| EvalError::new("comparison with NaN")),
            _ => Err(EvalError::new(format!(
                "'<' not supported between instances of '{}' and '{}'",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

fn contains(container: &Value, item: &Value) -> std::result::Result<bool, EvalError> {
    match (container, item) {
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::Str(_), other) => Err(EvalError::new(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (Value::Range { start, stop, step }, _) => {
            let Some(n) = item.as_i64() else {
                return Ok(false);
            };
            let (start, stop, step, n) = (
                i128::from(*start),
                i128::from(*stop),
                i128::from(*step),
                i128::from(n),
            );
            let inside = if step > 0 {
                start <= n && n < stop
            } else {
                stop < n && n <= start
            };
            Ok(inside && (n - start) % step == 0)
        }
        _ => match container.iter_items() {
            Some(items) => Ok(items.iter().any(|x| x.py_eq(item))),
            None => Err(EvalError::new(format!(
                "argument of type '{}' is not iterable",
                container.type_name()
            ))),
        },
    }
}

fn compare_values(op: CmpOp, left: &Value, right: &Value) -> std::result::Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Eq => left.py_eq(right),
        CmpOp::NotEq => !left.py_eq(right),
        CmpOp::Lt => order(left, right)? == Ordering::Less,
        CmpOp::LtE => order(left, right)? != Ordering::Greater,
        CmpOp::Gt => order(left, right)? == Ordering::Greater,
        CmpOp::GtE => order(left, right)? != Ordering::Less,
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
        CmpOp::Is => is_same(left, right),
        CmpOp::IsNot => !is_same(left, right),
    })
}

/// Identity for the singletons; distinct containers are never identical.
fn is_same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

fn subscript(base: Value, index: Value) -> EvalResult {
    if let Value::Dict(_) = base {
        return base
            .dict_get(&index)
            .cloned()
            .ok_or_else(|| EvalError::new(format!("key {index} not found")));
    }
    let items = base.iter_items().ok_or_else(|| {
        EvalError::new(format!("'{}' object is not subscriptable", base.type_name()))
    })?;
    let i = index.as_i64().ok_or_else(|| {
        EvalError::new(format!("indices must be integers, not {}", index.type_name()))
    })?;
    let len = i64::try_from(items.len()).map_err(|_| overflow())?;
    let position = if i < 0 { i + len } else { i };
    usize::try_from(position)
        .ok()
        .and_then(|p| items.get(p).cloned())
        .ok_or_else(|| EvalError::new("index out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::logical_lines;
    use crate::parser::parse_expression;

    fn expr(src: &str) -> Expr {
        let lines = logical_lines(src).unwrap();
        parse_expression(&lines[0].tokens).unwrap()
    }

    fn eval(src: &str) -> EvalResult {
        let flags = FlagTable::default();
        Evaluator::new(&flags).eval(&expr(src))
    }

    #[test]
    fn literal_eval_accepts_signed_numbers_and_containers() {
        let value = literal_eval(&expr("{'overlap': -0.02, 'list': [1, (2, 3)], 's': {1, 1}}"))
            .unwrap();
        assert_eq!(
            value.dict_get(&Value::Str("overlap".into())),
            Some(&Value::Float(-0.02))
        );
        assert_eq!(
            value.dict_get(&Value::Str("s".into())),
            Some(&Value::Set(vec![Value::Int(1)]))
        );
    }

    #[test]
    fn literal_eval_rejects_names_and_operations() {
        for src in ["a", "1 + 2", "range(3)", "-'x'", "{**a}"] {
            assert!(literal_eval(&expr(src)).is_err(), "{src}");
        }
    }

    #[test]
    fn evaluates_flags() {
        assert_eq!(eval("self.args.fontawesome").unwrap(), Value::Bool(true));
        assert_eq!(eval("self.args.careful").unwrap(), Value::Bool(false));
        assert_eq!(eval("box_enabled or box_keep").unwrap(), Value::Bool(false));
        assert_eq!(
            eval("0.7 if not self.args.careful else 0.5").unwrap(),
            Value::Float(0.7)
        );
    }

    #[test]
    fn and_or_return_operands() {
        assert_eq!(eval("0 or 'x'").unwrap(), Value::Str("x".into()));
        assert_eq!(eval("[] and 3").unwrap(), Value::List(vec![]));
        assert_eq!(eval("1 and 2 and 3").unwrap(), Value::Int(3));
        // short-circuit skips the unknown name
        assert_eq!(eval("True or missing").unwrap(), Value::Bool(true));
    }

    #[test]
    fn arithmetic_follows_python() {
        assert_eq!(eval("7 // -2").unwrap(), Value::Int(-4));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Int(2));
        assert_eq!(eval("7 % -3").unwrap(), Value::Int(-2));
        assert_eq!(eval("1 / 4").unwrap(), Value::Float(0.25));
        assert_eq!(eval("0xf000 + 0x10").unwrap(), Value::Int(0xf010));
        assert_eq!(eval("'a' + 'b'").unwrap(), Value::Str("ab".into()));
        assert_eq!(eval("[1] + [2]").unwrap(), Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(eval("2 ** 10").unwrap(), Value::Int(1024));
        assert!(eval("1 / 0").is_err());
        assert!(eval("9223372036854775807 + 1").is_err());
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(eval("1 < 2 < 3").unwrap(), Value::Bool(true));
        assert_eq!(eval("1 < 3 < 2").unwrap(), Value::Bool(false));
        assert_eq!(eval("2 in [1, 2]").unwrap(), Value::Bool(true));
        assert_eq!(eval("'pa' in 'pa1'").unwrap(), Value::Bool(true));
        assert_eq!(eval("5 not in range(0, 10, 2)").unwrap(), Value::Bool(true));
        assert_eq!(eval("None is None").unwrap(), Value::Bool(true));
        assert_eq!(eval("1 is not None").unwrap(), Value::Bool(true));
    }

    #[test]
    fn builds_ranges() {
        assert_eq!(
            eval("range(0xe0b0, 0xe0b4)").unwrap(),
            Value::Range {
                start: 0xe0b0,
                stop: 0xe0b4,
                step: 1
            }
        );
        assert!(eval("range(0, 10, 0)").is_err());
        assert!(eval("range(0, 1 << 40)").is_err());
    }

    #[test]
    fn ranges_with_extreme_bounds_stay_exact() {
        let wide = "range(-4611686018427387904, 4611686018427387904, 4611686018427387904)";
        assert_eq!(eval(&format!("0 in {wide}")).unwrap(), Value::Bool(true));
        assert_eq!(eval(&format!("1 in {wide}")).unwrap(), Value::Bool(false));
        assert_eq!(
            eval(&format!("4611686018427387904 in {wide}")).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(eval(&format!("{wide}[-1]")).unwrap(), Value::Int(0));
    }

    #[test]
    fn rejects_everything_else() {
        for src in [
            "open('x')",
            "__import__('os')",
            "self.args.unknown",
            "self.sourceFont",
            "os.environ",
            "unknown_name",
            "range(stop=3)",
        ] {
            assert!(eval(src).is_err(), "{src}");
        }
    }

    #[test]
    fn unpacks_dicts() {
        let value = eval("{'a': 1, **{'a': 2, 'b': 3}}").unwrap();
        assert_eq!(value.dict_get(&Value::Str("a".into())), Some(&Value::Int(2)));
        assert_eq!(value.dict_get(&Value::Str("b".into())), Some(&Value::Int(3)));
    }
}
