// this_file: crates/glyphrules-extract/src/value.rs

//! Runtime values produced by literal and restricted evaluation.

use std::fmt;

/// A Python-like value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    /// Insertion-ordered mapping; later duplicate keys replace earlier ones
    Dict(Vec<(Value, Value)>),
    /// Half-open integer range with a step
    Range { start: i64, stop: i64, step: i64 },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
        }
    }

    /// Python truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => !v.is_empty(),
            Value::Dict(v) => !v.is_empty(),
            Value::Range { .. } => self.range_len() > 0,
        }
    }

    /// Numeric view: bools and ints widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view: bools count as integers, floats do not.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Element count, computed in i128 so extreme bounds cannot overflow.
    fn range_len(&self) -> i128 {
        let Value::Range { start, stop, step } = *self else {
            return 0;
        };
        let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
        if step > 0 && stop > start {
            (stop - start + step - 1) / step
        } else if step < 0 && start > stop {
            (start - stop - step - 1) / -step
        } else {
            0
        }
    }

    /// Elements of an iterable value, `None` for non-iterables.
    pub fn iter_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => Some(v.clone()),
            Value::Dict(pairs) => Some(pairs.iter().map(|(k, _)| k.clone()).collect()),
            Value::Str(s) => Some(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Range { start, step, .. } => {
                let (start, step) = (i128::from(*start), i128::from(*step));
                Some(
                    (0..self.range_len())
                        .filter_map(|i| i64::try_from(start + i * step).ok())
                        .map(Value::Int)
                        .collect(),
                )
            }
            _ => None,
        }
    }

    /// Python `==`: numbers compare across int/float/bool.
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.py_eq(y)))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(k2, v2)| k.py_eq(k2) && v.py_eq(v2))
                    })
            }
            (Value::Range { .. }, Value::Range { .. }) => {
                self.iter_items().map(Value::List) == other.iter_items().map(Value::List)
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Look up `key` in a dict value.
    pub fn dict_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Dict(pairs) => pairs.iter().rev().find(|(k, _)| k.py_eq(key)).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build a dict, letting later duplicate keys replace earlier ones in place.
    pub fn dict_from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> Value {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (k, v) in pairs {
            match out.iter_mut().find(|(existing, _)| existing.py_eq(&k)) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            }
        }
        Value::Dict(out)
    }

    /// Build a set, dropping duplicates.
    pub fn set_from_items(items: impl IntoIterator<Item = Value>) -> Value {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            if !out.iter().any(|existing| existing.py_eq(&item)) {
                out.push(item);
            }
        }
        Value::Set(out)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(v) => {
                write!(f, "[")?;
                join(f, v)?;
                write!(f, "]")
            }
            Value::Tuple(v) => {
                write!(f, "(")?;
                join(f, v)?;
                write!(f, ")")
            }
            Value::Set(v) => {
                write!(f, "{{")?;
                join(f, v)?;
                write!(f, "}}")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Range { start, stop, step } => write!(f, "range({start}, {stop}, {step})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_python() {
        assert!(!Value::None.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Float(0.5).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(!Value::List(vec![]).truthy());
        assert!(Value::Tuple(vec![Value::None]).truthy());
        assert!(!Value::Range {
            start: 5,
            stop: 5,
            step: 1
        }
        .truthy());
    }

    #[test]
    fn numbers_compare_across_types() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Str("1".into()).py_eq(&Value::Int(1)));
    }

    #[test]
    fn range_items() {
        let r = Value::Range {
            start: 10,
            stop: 0,
            step: -3,
        };
        assert_eq!(
            r.iter_items().unwrap(),
            vec![Value::Int(10), Value::Int(7), Value::Int(4), Value::Int(1)]
        );
    }

    #[test]
    fn range_with_extreme_bounds_does_not_overflow() {
        let wide = Value::Range {
            start: -(1 << 62),
            stop: 1 << 62,
            step: 1 << 62,
        };
        assert!(wide.truthy());
        assert_eq!(
            wide.iter_items().unwrap(),
            vec![Value::Int(-(1 << 62)), Value::Int(0)]
        );

        let down = Value::Range {
            start: i64::MAX,
            stop: i64::MIN,
            step: i64::MIN,
        };
        assert_eq!(
            down.iter_items().unwrap(),
            vec![Value::Int(i64::MAX), Value::Int(-1)]
        );
    }

    #[test]
    fn dict_keeps_first_position_and_last_value() {
        let d = Value::dict_from_pairs([
            (Value::Str("a".into()), Value::Int(1)),
            (Value::Str("b".into()), Value::Int(2)),
            (Value::Str("a".into()), Value::Int(3)),
        ]);
        assert_eq!(d.dict_get(&Value::Str("a".into())), Some(&Value::Int(3)));
        let Value::Dict(pairs) = d else { panic!() };
        assert_eq!(pairs.len(), 2);
    }
}
