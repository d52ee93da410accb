use std::fmt;

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::location::Location;
use crate::mapping::Mapping;
use crate::path::{Path, PathElement};

/// The kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Invalid,
    Null,
    Bool,
    Int,
    Float,
    String,
    Map,
    Sequence,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Map => "map",
            Kind::Sequence => "sequence",
        }
    }

    /// Kind name with an indefinite article, as used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Kind::Invalid => "an invalid value",
            Kind::Null => "null",
            Kind::Bool => "a bool",
            Kind::Int => "an int",
            Kind::Float => "a float",
            Kind::String => "a string",
            Kind::Map => "a map",
            Kind::Sequence => "a sequence",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a [`Value`].
#[derive(Debug, Clone)]
pub enum Data {
    Invalid,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(Mapping),
    Sequence(Vec<Value>),
}

/// Dynamic configuration value with provenance.
///
/// Values are never mutated in place; builders such as [`Value::with_locations`]
/// consume the receiver and return a new value. Equality compares content
/// only, ignoring locations and the anchor flag.
#[derive(Debug, Clone)]
pub struct Value {
    data: Data,
    locations: Vec<Location>,
    anchor: bool,
}

impl Value {
    pub const NULL: Value = Value {
        data: Data::Null,
        locations: Vec::new(),
        anchor: false,
    };

    /// Error sentinel; never part of a valid tree.
    pub const INVALID: Value = Value {
        data: Data::Invalid,
        locations: Vec::new(),
        anchor: false,
    };

    pub fn new(data: Data) -> Self {
        Self {
            data,
            locations: Vec::new(),
            anchor: false,
        }
    }

    pub fn map(map: Mapping) -> Self {
        Self::new(Data::Map(map))
    }

    pub fn seq(items: Vec<Value>) -> Self {
        Self::new(Data::Sequence(items))
    }

    /// Replace the locations. The most specific location comes first.
    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_location(self, location: Location) -> Self {
        self.with_locations(vec![location])
    }

    /// Mark this value as a reusable fragment of the source document.
    pub fn mark_anchor(mut self) -> Self {
        self.anchor = true;
        self
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn kind(&self) -> Kind {
        match self.data {
            Data::Invalid => Kind::Invalid,
            Data::Null => Kind::Null,
            Data::Bool(_) => Kind::Bool,
            Data::Int(_) => Kind::Int,
            Data::Float(_) => Kind::Float,
            Data::String(_) => Kind::String,
            Data::Map(_) => Kind::Map,
            Data::Sequence(_) => Kind::Sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.data, Data::Invalid)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, Data::Null)
    }

    pub fn is_anchor(&self) -> bool {
        self.anchor
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Most specific location, or an empty one for in-memory values.
    pub fn location(&self) -> Location {
        self.locations.first().cloned().unwrap_or_default()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            Data::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.data {
            Data::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match &self.data {
            Data::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Look up `key` if this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Look up element `index` if this value is a sequence.
    pub fn index(&self, index: usize) -> Option<&Value> {
        self.as_seq().and_then(|items| items.get(index))
    }

    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        path.elements()
            .iter()
            .try_fold(self, |current, element| match element {
                PathElement::Key(key) => current.get(key),
                PathElement::Index(index) => current.index(*index),
            })
    }

    /// Plain projection without provenance. Invalid values project to null.
    pub fn to_any(&self) -> serde_json::Value {
        match &self.data {
            Data::Invalid | Data::Null => serde_json::Value::Null,
            Data::Bool(v) => serde_json::Value::Bool(*v),
            Data::Int(v) => serde_json::Value::from(*v),
            Data::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Data::String(v) => serde_json::Value::String(v.clone()),
            Data::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.to_owned(), v.to_any())).collect(),
            ),
            Data::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_any).collect())
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::NULL
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.data, &other.data) {
            (Data::Invalid, Data::Invalid) | (Data::Null, Data::Null) => true,
            (Data::Bool(a), Data::Bool(b)) => a == b,
            (Data::Int(a), Data::Int(b)) => a == b,
            (Data::Float(a), Data::Float(b)) => a == b,
            (Data::String(a), Data::String(b)) => a == b,
            (Data::Map(a), Data::Map(b)) => a == b,
            (Data::Sequence(a), Data::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::new(Data::Bool(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::new(Data::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::new(Data::Int(i64::from(v)))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::new(Data::Float(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::new(Data::String(v.to_owned()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::new(Data::String(v))
    }
}

impl From<Mapping> for Value {
    fn from(v: Mapping) -> Self {
        Self::map(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::seq(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::NULL,
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::from(i),
                // u64 beyond i64::MAX and non-integers
                None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.data {
            Data::Invalid => Err(S::Error::custom("cannot serialize an invalid value")),
            Data::Null => serializer.serialize_unit(),
            Data::Bool(v) => serializer.serialize_bool(*v),
            Data::Int(v) => serializer.serialize_i64(*v),
            Data::Float(v) => serializer.serialize_f64(*v),
            Data::String(v) => serializer.serialize_str(v),
            Data::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Data::Sequence(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
        }
    }
}
