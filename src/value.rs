//! The recursive value model: an eight-variant sum type with
//! `List`/`Map`/`Structure` composites, deep equality, and no encode/decode
//! logic of its own (that's `packstream`).

use indexmap::IndexMap;

/// A Bolt/PackStream value. Equality is deep and structural; `Map` compares
/// as a set of key/value pairs, not by insertion order (`IndexMap`'s
/// `PartialEq` already does this).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Structure(Structure),
}

/// A tagged, ordered tuple of fields: the on-wire vehicle for every Bolt
/// message and every typed domain record (Node, Relationship, Date, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub tag: u8,
    pub fields: Vec<Value>,
}

impl Structure {
    pub fn new(tag: u8, fields: Vec<Value>) -> Self {
        Structure { tag, fields }
    }

    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }
}

/// Human-readable variant tag, used in error messages and in tests that
/// assert on the shape of a decoded value without matching every arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Map,
    Structure,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Structure(_) => ValueKind::Structure,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Value::Structure(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<Structure> for Value {
    fn from(s: Structure) -> Self {
        Value::Structure(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_equality_is_order_independent() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), Value::Integer(1));
        a.insert("y".to_string(), Value::Integer(2));
        let mut b = IndexMap::new();
        b.insert("y".to_string(), Value::Integer(2));
        b.insert("x".to_string(), Value::Integer(1));
        assert_eq!(Value::Map(a), Value::Map(b));
    }

    #[test]
    fn list_equality_is_order_dependent() {
        let a = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::List(vec![Value::Integer(2), Value::Integer(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn structure_equality_checks_tag_and_fields() {
        let a = Value::Structure(Structure::new(0x4E, vec![Value::Integer(1)]));
        let b = Value::Structure(Structure::new(0x4E, vec![Value::Integer(1)]));
        let c = Value::Structure(Structure::new(0x52, vec![Value::Integer(1)]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn kind_introspection() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
        assert_eq!(Value::from(1i64).kind(), ValueKind::Integer);
        assert_eq!(Value::from(1.0f64).kind(), ValueKind::Float);
        assert_eq!(Value::from("s").kind(), ValueKind::String);
    }
}
