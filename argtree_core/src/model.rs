use std::collections::hash_map;
use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

/// The cardinality of positional tokens to assign to an argument.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nargs {
    /// `?` (also `1`): At most one value, stored as a scalar.
    #[default]
    Optional,
    /// `N`: Up to `N` values, stored as a list of length `N`.
    /// Missing trailing slots are filled with [`Value::Missing`].
    Precisely(usize),
    /// `*`: Any number of values, including `0`.
    Any,
    /// `+`: At least one value must be available.
    AtLeastOne,
}

impl std::fmt::Display for Nargs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nargs::Optional => write!(f, "?"),
            Nargs::Precisely(n) => write!(f, "{n}"),
            Nargs::Any => write!(f, "*"),
            Nargs::AtLeastOne => write!(f, "+"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid nargs '{0}': expected '?', '*', '+' or a count.")]
pub struct InvalidNargs(String);

impl FromStr for Nargs {
    type Err = InvalidNargs;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "?" | "1" => Ok(Nargs::Optional),
            "*" => Ok(Nargs::Any),
            "+" => Ok(Nargs::AtLeastOne),
            _ => value
                .parse::<usize>()
                .map(Nargs::Precisely)
                .map_err(|_| InvalidNargs(value.to_string())),
        }
    }
}

impl From<usize> for Nargs {
    fn from(value: usize) -> Self {
        Nargs::Precisely(value)
    }
}

/// A resolved, dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Placeholder for an unfilled slot of a fixed-count argument.
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// An empty list counts as unset for the required/default checks.
    pub(crate) fn is_empty_list(&self) -> bool {
        matches!(self, Value::List(items) if items.is_empty())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Missing => write!(f, "<missing>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// The resolved destination/value mapping of one parse invocation.
///
/// A destination is either present with a value, or absent; there is no "unset" value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: HashMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    pub fn insert(&mut self, dest: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(dest.into(), value.into())
    }

    pub fn remove(&mut self, dest: &str) -> Option<Value> {
        self.values.remove(dest)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn into_inner(self) -> HashMap<String, Value> {
        self.values
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Namespace {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
