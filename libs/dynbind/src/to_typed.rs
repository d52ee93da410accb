use tracing::trace;

use crate::error::{Error, Result};
use crate::path::PathElement;
use crate::placeholder::is_pure_variable_reference;
use crate::reflect::{field_at_mut, FloatSlot, IntSlot, MapSlot, SeqSlot, Struct, Typed, TypedMut};
use crate::scalar::{float_to_int, format_float, parse_bool, parse_float, parse_int};
use crate::struct_info::struct_meta;
use crate::value::{Data, Kind, Value};

/// Populate `dst` from `src`.
///
/// Fields of `dst` that `src` does not mention are reset to their zero
/// value, so raising the same value twice gives the same result as raising
/// it into a fresh record. Keys that name no field are skipped; run
/// [`normalize`](crate::normalize) first to report them.
///
/// A pure variable reference such as `"${var.name}"` stands for a value
/// that is not known yet: wherever a record, map, sequence, bool, int or
/// float is expected, it zeroes the destination instead of failing.
pub fn raise<T: Typed>(dst: &mut T, src: &Value) -> Result<()> {
    to_typed(dst, src)
}

fn to_typed(dst: &mut dyn Typed, src: &Value) -> Result<()> {
    if !src.is_valid() {
        return Err(Error::UnsupportedKind {
            kind: Kind::Invalid.to_string(),
        });
    }

    match dst.reflect_mut() {
        TypedMut::Option(slot) => {
            if src.is_null() {
                slot.set_none();
                return Ok(());
            }
            to_typed(slot.get_or_insert_default(), src)
        }
        TypedMut::Struct(dst) => to_struct(dst, src),
        TypedMut::Map(dst) => to_map(dst, src),
        TypedMut::Seq(dst) => to_seq(dst, src),
        TypedMut::String(dst) => to_string(dst, src),
        TypedMut::Bool(dst) => to_bool(dst, src),
        TypedMut::Int(dst) => to_int(dst, src),
        TypedMut::Float(dst) => to_float(dst, src),
        TypedMut::Any(dst) => {
            *dst = src.to_any();
            Ok(())
        }
        TypedMut::Value(dst) => {
            *dst = src.clone();
            Ok(())
        }
    }
}

fn to_struct(dst: &mut dyn Struct, src: &Value) -> Result<()> {
    let map = match src.data() {
        Data::Map(map) => map,
        _ if is_absent(src) => {
            dst.zero();
            return Ok(());
        }
        _ => return Err(Error::expected("a map", src)),
    };

    // Start from zero so that fields missing from `src` do not keep stale values.
    dst.zero();

    let meta = struct_meta(dst.struct_type());
    for pair in map.pairs() {
        let name = pair.key.name();
        let Some(path) = meta.field(name) else {
            continue;
        };
        let Some(field) = field_at_mut(dst, &path.steps) else {
            continue;
        };
        to_typed(field, &pair.value).map_err(|e| e.within_key(name))?;
    }

    if let Some(steps) = &meta.value_field {
        if let Some(field) = field_at_mut(dst, steps) {
            if let TypedMut::Value(capture) = field.reflect_mut() {
                *capture = src.clone();
            }
        }
    }
    Ok(())
}

fn to_map(dst: &mut dyn MapSlot, src: &Value) -> Result<()> {
    let map = match src.data() {
        Data::Map(map) => map,
        _ if is_absent(src) => {
            dst.clear_entries();
            return Ok(());
        }
        _ => return Err(Error::expected("a map", src)),
    };

    dst.clear_entries();
    for pair in map.pairs() {
        let name = pair.key.name();
        to_typed(dst.insert_default(name.to_owned()), &pair.value)
            .map_err(|e| e.within_key(name))?;
    }
    Ok(())
}

fn to_seq(dst: &mut dyn SeqSlot, src: &Value) -> Result<()> {
    let items = match src.data() {
        Data::Sequence(items) => items,
        _ if is_absent(src) => {
            dst.clear_items();
            return Ok(());
        }
        _ => return Err(Error::expected("a sequence", src)),
    };

    dst.clear_items();
    for (i, item) in items.iter().enumerate() {
        to_typed(dst.push_default(), item).map_err(|e| e.within(PathElement::Index(i)))?;
    }
    Ok(())
}

fn to_string(dst: &mut String, src: &Value) -> Result<()> {
    *dst = match src.data() {
        Data::Null => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => b.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        _ => return Err(Error::expected("a string", src)),
    };
    Ok(())
}

fn to_bool(dst: &mut bool, src: &Value) -> Result<()> {
    *dst = match src.data() {
        Data::Null => false,
        Data::Bool(b) => *b,
        Data::String(s) => match parse_bool(s) {
            Some(b) => b,
            None if is_absent(src) => false,
            None => return Err(Error::mismatch(format!("cannot parse {s:?} as a bool"), src)),
        },
        _ => return Err(Error::expected("a bool", src)),
    };
    Ok(())
}

fn to_int(dst: &mut dyn IntSlot, src: &Value) -> Result<()> {
    let value = match src.data() {
        Data::Null => 0,
        Data::Int(i) => *i,
        Data::Float(f) => match float_to_int(*f) {
            Some(i) => i,
            None => return Err(Error::expected("an int", src)),
        },
        Data::String(s) => match parse_int(s) {
            Some(i) => i,
            None if is_absent(src) => 0,
            None => return Err(Error::mismatch(format!("cannot parse {s:?} as an int"), src)),
        },
        _ => return Err(Error::expected("an int", src)),
    };
    if dst.set_int(value) {
        Ok(())
    } else {
        Err(Error::mismatch(
            format!("value {value} is out of range for {}", dst.type_name()),
            src,
        ))
    }
}

fn to_float(dst: &mut dyn FloatSlot, src: &Value) -> Result<()> {
    let value = match src.data() {
        Data::Null => 0.0,
        Data::Float(f) => *f,
        Data::String(s) => match parse_float(s) {
            Some(f) => f,
            None if is_absent(src) => 0.0,
            None => return Err(Error::mismatch(format!("cannot parse {s:?} as a float"), src)),
        },
        _ => return Err(Error::expected("a float", src)),
    };
    if dst.set_float(value) {
        Ok(())
    } else {
        Err(Error::mismatch(
            format!("value {} is out of range for {}", format_float(value), dst.type_name()),
            src,
        ))
    }
}

/// Null, or a variable reference that has not been resolved yet.
fn is_absent(src: &Value) -> bool {
    match src.data() {
        Data::Null => true,
        Data::String(s) if is_pure_variable_reference(s) => {
            trace!(reference = %s, "zeroing destination for unresolved variable reference");
            true
        }
        _ => false,
    }
}
