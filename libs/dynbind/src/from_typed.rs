use crate::error::{Error, Result};
use crate::mapping::{Key, Mapping, Pair};
use crate::placeholder::is_pure_variable_reference;
use crate::reflect::{field_at, Struct, Typed, TypedRef};
use crate::struct_info::struct_meta;
use crate::value::{Kind, Value};

static NULL: Value = Value::NULL;

/// How zero values are rendered at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zero {
    /// Zero scalars and empty records collapse to null.
    Omit,
    /// As `Omit`, and empty maps and sequences collapse too.
    OmitField,
    /// Zero values are materialized.
    Include,
}

/// Lower a typed value into a [`Value`].
///
/// `reference` is the value `src` was previously raised from, or
/// [`Value::NULL`]. Scalars equal to their reference counterpart are
/// returned as that counterpart, locations included. Record fields that
/// lower to null are left out; a record with nothing left lowers to null
/// unless the reference already had a map in its place. Map entries and
/// sequence elements are always kept, zero or not.
pub fn lower<T: Typed>(src: &T, reference: &Value) -> Result<Value> {
    from_typed(src, reference, Zero::Omit)
}

fn from_typed(src: &dyn Typed, reference: &Value, zero: Zero) -> Result<Value> {
    match src.reflect() {
        TypedRef::Option(None) => Ok(null_like(reference)),
        // A set pointer was set on purpose, so its pointee is kept even if zero.
        TypedRef::Option(Some(inner)) => from_typed(inner, reference, Zero::Include),
        TypedRef::Struct(s) => from_struct(s, reference, zero),
        TypedRef::Map(entries) => from_map(entries, reference, zero),
        TypedRef::Seq(items) => from_seq(items, reference, zero),
        TypedRef::Bool(v) => Ok(from_scalar(Value::from(v), !v, reference, zero)),
        TypedRef::Int(v) => Ok(from_scalar(Value::from(v), v == 0, reference, zero)),
        TypedRef::Float(v) => Ok(from_scalar(Value::from(v), v == 0.0, reference, zero)),
        TypedRef::String(v) => Ok(from_string(v, reference, zero)),
        TypedRef::Any(v) => Ok(from_any(v, reference)),
        TypedRef::Value(v) if v.is_valid() => Ok(v.clone()),
        TypedRef::Value(_) => Err(Error::UnsupportedKind {
            kind: Kind::Invalid.to_string(),
        }),
    }
}

fn from_struct(src: &dyn Struct, reference: &Value, zero: Zero) -> Result<Value> {
    let meta = struct_meta(src.struct_type());
    let mut out = Mapping::with_capacity(meta.order.len());

    for (name, path) in meta.iter() {
        // Fields behind a null flattened pointer are absent.
        let Some(field) = field_at(src, &path.steps) else {
            continue;
        };

        let pair = reference_pair(reference, name);
        let field_ref = pair.map_or(&NULL, |pair| &pair.value);
        let mode = if meta.always_include(name) {
            Zero::Include
        } else {
            Zero::OmitField
        };

        let value = from_typed(field, field_ref, mode).map_err(|e| e.within_key(name))?;
        if value.is_null() {
            continue;
        }
        out.insert(key_for(pair, name), value);
    }

    if out.is_empty() {
        if is_placeholder(reference) {
            return Ok(reference.clone());
        }
        if reference.kind() != Kind::Map && zero != Zero::Include {
            return Ok(null_like(reference));
        }
    }
    Ok(Value::map(out).with_locations(reference.locations().to_vec()))
}

fn from_map(entries: Vec<(&str, &dyn Typed)>, reference: &Value, zero: Zero) -> Result<Value> {
    if entries.is_empty() {
        if is_placeholder(reference) {
            return Ok(reference.clone());
        }
        if reference.kind() != Kind::Map && zero == Zero::OmitField {
            return Ok(null_like(reference));
        }
    }

    let mut out = Mapping::with_capacity(entries.len());
    for (name, value) in entries {
        let pair = reference_pair(reference, name);
        let entry_ref = pair.map_or(&NULL, |pair| &pair.value);
        let value = from_typed(value, entry_ref, Zero::Include).map_err(|e| e.within_key(name))?;
        // Every entry is represented, even if it is null.
        out.insert(key_for(pair, name), value);
    }
    Ok(Value::map(out).with_locations(reference.locations().to_vec()))
}

fn from_seq(items: Vec<&dyn Typed>, reference: &Value, zero: Zero) -> Result<Value> {
    if items.is_empty() {
        if is_placeholder(reference) {
            return Ok(reference.clone());
        }
        if reference.kind() != Kind::Sequence && zero == Zero::OmitField {
            return Ok(null_like(reference));
        }
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let item_ref = reference
            .index(i)
            .filter(|v| !v.is_anchor())
            .unwrap_or(&NULL);
        let value = from_typed(item, item_ref, Zero::Include)
            .map_err(|e| e.within(crate::path::PathElement::Index(i)))?;
        out.push(value);
    }
    Ok(Value::seq(out).with_locations(reference.locations().to_vec()))
}

/// Bool, int and float. A zero value standing in for an unresolved
/// variable reference keeps the reference.
fn from_scalar(value: Value, is_zero: bool, reference: &Value, zero: Zero) -> Value {
    if value == *reference {
        return reference.clone();
    }
    if is_zero {
        if is_placeholder(reference) {
            return reference.clone();
        }
        if zero != Zero::Include && reference.is_null() {
            return null_like(reference);
        }
    }
    value
}

fn from_string(value: &str, reference: &Value, zero: Zero) -> Value {
    if reference.as_str() == Some(value) {
        return reference.clone();
    }
    if value.is_empty() && zero != Zero::Include && reference.is_null() {
        return null_like(reference);
    }
    Value::from(value)
}

fn from_any(value: &serde_json::Value, reference: &Value) -> Value {
    let value = Value::from(value);
    if value == *reference {
        reference.clone()
    } else {
        value
    }
}

/// Reference entry for `name`. Anchors count as absent.
fn reference_pair<'a>(reference: &'a Value, name: &str) -> Option<&'a Pair> {
    reference
        .as_map()?
        .get_pair(name)
        .filter(|pair| !pair.value.is_anchor())
}

/// Reuse the reference key so its locations survive.
fn key_for(pair: Option<&Pair>, name: &str) -> Key {
    pair.map_or_else(|| Key::from(name), |pair| pair.key.clone())
}

fn is_placeholder(value: &Value) -> bool {
    value.as_str().is_some_and(is_pure_variable_reference)
}

/// Null carrying the reference's locations when the reference was null too.
fn null_like(reference: &Value) -> Value {
    if reference.is_null() {
        Value::NULL.with_locations(reference.locations().to_vec())
    } else {
        Value::NULL
    }
}
