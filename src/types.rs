//! Core types for spark-compose.
//!
//! These types define the foundation that everything builds on.
//! Values flow from a parent's render output into a child's props, and from
//! state initializers into render steps. The core never interprets them; the
//! platform adapter does.

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Value
// =============================================================================

/// An opaque property or state value.
///
/// The composition core only moves these around and compares them. Meaning is
/// assigned by render steps and by the platform adapter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(PropMap),
}

impl Value {
    /// Integer view, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// String view, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Bool view, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => write!(f, "{map}"),
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
        Value::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
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

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<PropMap> for Value {
    fn from(value: PropMap) -> Self {
        Value::Map(value)
    }
}

// =============================================================================
// PropMap - Props and State
// =============================================================================

/// Name → value map used for both props and local state.
///
/// Ordered by name so that equality and rendering are deterministic;
/// insertion order carries no meaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropMap(BTreeMap<String, Value>);

/// Props supplied by a parent's render output.
pub type Props = PropMap;

/// Local state owned by one instance.
pub type State = PropMap;

impl PropMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Integer at `name`, or `0` when absent or not an integer.
    pub fn get_int(&self, name: &str) -> i64 {
        self.get(name).and_then(Value::as_int).unwrap_or(0)
    }

    /// String at `name`, or `""` when absent or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for PropMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PropMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// =============================================================================
// InstanceId
// =============================================================================

/// Generational handle to one instance inside an engine.
///
/// The index names an arena slot; the generation changes every time the slot
/// is freed, so a handle to a destroyed instance never resolves to a newer
/// instance that reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl InstanceId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index.
    pub const fn index(self) -> usize {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_map_helpers() {
        let mut props = PropMap::new().with("count", 3).with("label", "hi");
        assert_eq!(props.get_int("count"), 3);
        assert_eq!(props.get_str("label"), "hi");
        assert_eq!(props.get_int("missing"), 0);
        assert_eq!(props.get_str("count"), "");

        let prev = props.set("count", 4);
        assert_eq!(prev, Some(Value::Int(3)));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_prop_map_order_irrelevant() {
        let a = PropMap::new().with("x", 1).with("y", 2);
        let b = PropMap::new().with("y", 2).with("x", 1);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{x: 1, y: 2}");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(7).to_string(), "7");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::from(true)]).to_string(),
            "[1, true]"
        );
    }

    #[test]
    fn test_instance_id_display() {
        let id = InstanceId::new(3, 2);
        assert_eq!(id.to_string(), "i3v2");
        assert_eq!(id.index(), 3);
        assert_eq!(id.generation(), 2);
    }
}
