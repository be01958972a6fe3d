//! Decoded Bolt values.
//!
//! Values arrive at the session already decoded from PackStream; this is the
//! in-memory form used for query parameters, record fields and response metadata.

use std::collections::HashMap;
use std::fmt;

/// A decoded Bolt value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Float(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// List of values
    List(Vec<BoltValue>),
    /// Map of string keys to values
    Map(HashMap<String, BoltValue>),
    /// Opaque structure (graph or temporal type), passed through untouched
    Structure {
        /// Structure tag
        tag: u8,
        /// Structure fields
        fields: Vec<BoltValue>,
    },
}

impl BoltValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, BoltValue::Null)
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BoltValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            BoltValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            BoltValue::Float(f) => Some(*f),
            BoltValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoltValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list reference.
    pub fn as_list(&self) -> Option<&[BoltValue]> {
        match self {
            BoltValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Try to get as map reference.
    pub fn as_map(&self) -> Option<&HashMap<String, BoltValue>> {
        match self {
            BoltValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Collect a list of strings, skipping non-string items.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.as_list().map(|list| {
            list.iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    }

    /// Get the type name for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            BoltValue::Null => "Null",
            BoltValue::Boolean(_) => "Boolean",
            BoltValue::Integer(_) => "Integer",
            BoltValue::Float(_) => "Float",
            BoltValue::Bytes(_) => "Bytes",
            BoltValue::String(_) => "String",
            BoltValue::List(_) => "List",
            BoltValue::Map(_) => "Map",
            BoltValue::Structure { .. } => "Structure",
        }
    }
}

impl fmt::Display for BoltValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoltValue::Null => write!(f, "null"),
            BoltValue::Boolean(b) => write!(f, "{}", b),
            BoltValue::Integer(i) => write!(f, "{}", i),
            BoltValue::Float(x) => write!(f, "{}", x),
            BoltValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            BoltValue::String(s) => write!(f, "{:?}", s),
            BoltValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            BoltValue::Map(map) => write!(f, "{{{} entries}}", map.len()),
            BoltValue::Structure { tag, fields } => {
                write!(f, "Structure(0x{:02X}, {} fields)", tag, fields.len())
            }
        }
    }
}

impl From<bool> for BoltValue {
    fn from(v: bool) -> Self {
        BoltValue::Boolean(v)
    }
}

impl From<i64> for BoltValue {
    fn from(v: i64) -> Self {
        BoltValue::Integer(v)
    }
}

impl From<i32> for BoltValue {
    fn from(v: i32) -> Self {
        BoltValue::Integer(v as i64)
    }
}

impl From<f64> for BoltValue {
    fn from(v: f64) -> Self {
        BoltValue::Float(v)
    }
}

impl From<String> for BoltValue {
    fn from(v: String) -> Self {
        BoltValue::String(v)
    }
}

impl From<&str> for BoltValue {
    fn from(v: &str) -> Self {
        BoltValue::String(v.to_string())
    }
}

impl From<Vec<BoltValue>> for BoltValue {
    fn from(v: Vec<BoltValue>) -> Self {
        BoltValue::List(v)
    }
}

impl From<HashMap<String, BoltValue>> for BoltValue {
    fn from(v: HashMap<String, BoltValue>) -> Self {
        BoltValue::Map(v)
    }
}
