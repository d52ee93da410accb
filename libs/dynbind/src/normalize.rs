use std::any::TypeId;

use tracing::trace;

use crate::diag::{Diagnostic, Diagnostics};
use crate::mapping::Mapping;
use crate::path::Path;
use crate::placeholder::is_pure_variable_reference;
use crate::reflect::{StructType, TypeInfo, Typed};
use crate::scalar::{float_to_int, format_float, int_to_float, parse_bool, parse_float, parse_int};
use crate::struct_info::struct_meta;
use crate::value::{Data, Kind, Value};

/// Knobs for [`normalize_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Add every known record field missing from the source, set to its
    /// zero value. Records are completed recursively; a record already
    /// being completed further up is left out.
    pub include_missing_fields: bool,
}

/// Check `src` against the shape of `T`, coercing scalars where nothing is lost.
///
/// Problems are reported as diagnostics instead of failing: the offending
/// node is dropped from the output and its siblings are still checked. If
/// the root itself cannot be used, the returned value is invalid.
pub fn normalize<T: Typed>(src: &Value) -> (Value, Diagnostics) {
    normalize_with::<T>(src, NormalizeOptions::default())
}

pub fn normalize_with<T: Typed>(src: &Value, options: NormalizeOptions) -> (Value, Diagnostics) {
    normalize_type(T::type_info(), src, options)
}

/// [`normalize_with`] for a shape known only at runtime.
pub fn normalize_type(ty: TypeInfo, src: &Value, options: NormalizeOptions) -> (Value, Diagnostics) {
    let mut normalizer = Normalizer {
        options,
        diags: Diagnostics::new(),
        completing: Vec::new(),
    };
    let value = normalizer.normalize(ty, src, &Path::root());
    (value, normalizer.diags)
}

struct Normalizer {
    options: NormalizeOptions,
    diags: Diagnostics,
    /// Records whose missing fields are being filled in, outermost first.
    completing: Vec<TypeId>,
}

impl Normalizer {
    fn normalize(&mut self, ty: TypeInfo, src: &Value, path: &Path) -> Value {
        match ty {
            // Records, maps and sequences accept null themselves; scalars report it.
            TypeInfo::Option(inner) => self.normalize(inner(), src, path),
            TypeInfo::Struct(st) => self.normalize_struct(st, src, path),
            TypeInfo::Map(inner) => self.normalize_map(inner(), src, path),
            TypeInfo::Seq(inner) => self.normalize_seq(inner(), src, path),
            TypeInfo::String => self.normalize_string(src, path),
            TypeInfo::Bool => self.normalize_bool(src, path),
            TypeInfo::Int => self.normalize_int(src, path),
            TypeInfo::Float => self.normalize_float(src, path),
            TypeInfo::Any | TypeInfo::Value => src.clone(),
        }
    }

    fn normalize_struct(&mut self, st: StructType, src: &Value, path: &Path) -> Value {
        let map = match src.data() {
            Data::Map(map) => map,
            _ if is_unresolved(src) => return src.clone(),
            _ => return self.mismatch(Kind::Map, src, path),
        };

        let meta = struct_meta(st);
        let mut out = Mapping::with_capacity(map.len());
        for pair in map.pairs() {
            let name = pair.key.name();
            let Some(field) = meta.field(name) else {
                let locations = if pair.key.locations().is_empty() {
                    pair.value.locations()
                } else {
                    pair.key.locations()
                };
                self.diags.push(
                    Diagnostic::warning(format!("unknown field: {name}"))
                        .with_detail(format!("{} accepts: {}", meta.name, meta.order.join(", ")))
                        .with_locations(locations.to_vec())
                        .at(path.clone()),
                );
                trace!(%path, field = name, "dropping unknown field");
                continue;
            };

            let child = path.key(name);
            let value = self.normalize((field.info.ty)(), &pair.value, &child);
            if !value.is_valid() {
                trace!(path = %child, "dropping node that failed normalization");
                continue;
            }
            out.insert(pair.key.clone(), value);
        }

        if self.options.include_missing_fields {
            self.completing.push(st.id);
            for (name, field) in meta.iter() {
                if out.contains_key(name) {
                    continue;
                }
                if let Some(zero) = self.zero_value((field.info.ty)()) {
                    out.insert(name, zero);
                }
            }
            self.completing.pop();
        }

        Value::map(out).with_locations(src.locations().to_vec())
    }

    fn normalize_map(&mut self, ty: TypeInfo, src: &Value, path: &Path) -> Value {
        let map = match src.data() {
            Data::Map(map) => map,
            _ if is_unresolved(src) => return src.clone(),
            _ => return self.mismatch(Kind::Map, src, path),
        };

        let mut out = Mapping::with_capacity(map.len());
        for pair in map.pairs() {
            let child = path.key(pair.key.name());
            let value = self.normalize(ty, &pair.value, &child);
            if !value.is_valid() {
                trace!(path = %child, "dropping node that failed normalization");
                continue;
            }
            out.insert(pair.key.clone(), value);
        }
        Value::map(out).with_locations(src.locations().to_vec())
    }

    fn normalize_seq(&mut self, ty: TypeInfo, src: &Value, path: &Path) -> Value {
        let items = match src.data() {
            Data::Sequence(items) => items,
            _ if is_unresolved(src) => return src.clone(),
            _ => return self.mismatch(Kind::Sequence, src, path),
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let child = path.index(i);
            let value = self.normalize(ty, item, &child);
            if !value.is_valid() {
                trace!(path = %child, "dropping node that failed normalization");
                continue;
            }
            out.push(value);
        }
        Value::seq(out).with_locations(src.locations().to_vec())
    }

    fn normalize_string(&mut self, src: &Value, path: &Path) -> Value {
        let text = match src.data() {
            Data::String(_) => return src.clone(),
            Data::Bool(b) => b.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => format_float(*f),
            Data::Null => return self.null(Kind::String, src, path),
            _ => return self.mismatch(Kind::String, src, path),
        };
        Value::from(text).with_locations(src.locations().to_vec())
    }

    fn normalize_bool(&mut self, src: &Value, path: &Path) -> Value {
        match src.data() {
            Data::Bool(_) => src.clone(),
            Data::String(s) => match parse_bool(s) {
                Some(b) => Value::from(b).with_locations(src.locations().to_vec()),
                None if is_pure_variable_reference(s) => src.clone(),
                None => self.mismatch(Kind::Bool, src, path),
            },
            Data::Null => self.null(Kind::Bool, src, path),
            _ => self.mismatch(Kind::Bool, src, path),
        }
    }

    fn normalize_int(&mut self, src: &Value, path: &Path) -> Value {
        let value = match src.data() {
            Data::Int(_) => return src.clone(),
            Data::Float(f) => match float_to_int(*f) {
                Some(i) => i,
                None => {
                    let summary = format!(
                        "cannot accurately represent \"{}\" as integer due to precision loss",
                        format_float(*f)
                    );
                    return self.error(summary, src, path);
                }
            },
            Data::String(s) => match parse_int(s) {
                Some(i) => i,
                None if is_pure_variable_reference(s) => return src.clone(),
                None => return self.error(format!("cannot parse {s:?} as an integer"), src, path),
            },
            Data::Null => return self.null(Kind::Int, src, path),
            _ => return self.mismatch(Kind::Int, src, path),
        };
        Value::from(value).with_locations(src.locations().to_vec())
    }

    fn normalize_float(&mut self, src: &Value, path: &Path) -> Value {
        let value = match src.data() {
            Data::Float(_) => return src.clone(),
            Data::Int(i) => match int_to_float(*i) {
                Some(f) => f,
                None => {
                    let summary = format!(
                        "cannot accurately represent \"{i}\" as floating point number due to precision loss"
                    );
                    return self.error(summary, src, path);
                }
            },
            Data::String(s) => match parse_float(s) {
                Some(f) => f,
                None if is_pure_variable_reference(s) => return src.clone(),
                None => {
                    return self.error(format!("cannot parse {s:?} as a floating point number"), src, path);
                }
            },
            Data::Null => return self.null(Kind::Float, src, path),
            _ => return self.mismatch(Kind::Float, src, path),
        };
        Value::from(value).with_locations(src.locations().to_vec())
    }

    /// Zero value materialized for a missing field, if the shape has one.
    fn zero_value(&mut self, ty: TypeInfo) -> Option<Value> {
        match ty {
            TypeInfo::Bool => Some(Value::from(false)),
            TypeInfo::Int => Some(Value::from(0)),
            TypeInfo::Float => Some(Value::from(0.0)),
            TypeInfo::String => Some(Value::from("")),
            TypeInfo::Map(_) => Some(Value::map(Mapping::new())),
            TypeInfo::Seq(_) => Some(Value::seq(Vec::new())),
            TypeInfo::Struct(st) if self.completing.contains(&st.id) => None,
            TypeInfo::Struct(st) => {
                Some(self.normalize_struct(st, &Value::map(Mapping::new()), &Path::root()))
            }
            TypeInfo::Option(inner) => self.zero_value(inner()),
            TypeInfo::Any | TypeInfo::Value => None,
        }
    }

    fn mismatch(&mut self, expected: Kind, src: &Value, path: &Path) -> Value {
        self.diags.push(
            Diagnostic::warning(format!("expected {expected}, found {}", src.kind()))
                .with_locations(src.locations().to_vec())
                .at(path.clone()),
        );
        Value::INVALID
    }

    fn null(&mut self, expected: Kind, src: &Value, path: &Path) -> Value {
        self.error(format!("expected a {expected} value, found null"), src, path)
    }

    fn error(&mut self, summary: String, src: &Value, path: &Path) -> Value {
        self.diags.push(
            Diagnostic::error(summary)
                .with_locations(src.locations().to_vec())
                .at(path.clone()),
        );
        Value::INVALID
    }
}

/// Null or a pure variable reference; both stand in for any record, map or sequence.
fn is_unresolved(src: &Value) -> bool {
    match src.data() {
        Data::Null => true,
        Data::String(s) => is_pure_variable_reference(s),
        _ => false,
    }
}
