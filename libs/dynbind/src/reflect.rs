//! Runtime view of destination types.
//!
//! A destination type exposes its shape through [`Typed::type_info`] and its
//! contents through [`Typed::reflect`] / [`Typed::reflect_mut`]. Records get
//! these from `#[derive(Typed)]`; the implementations below cover scalars,
//! `Option` (the nullable pointer), `Box`, `Vec`, string-keyed maps,
//! `serde_json::Value` (a destination for any plain value) and [`Value`]
//! itself (the value capture field).

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::value::{Kind, Value};

/// Static shape of a destination type.
///
/// Nested shapes are function pointers so recursive types can describe
/// themselves without recursing at construction.
#[derive(Debug, Clone, Copy)]
pub enum TypeInfo {
    Bool,
    Int,
    Float,
    String,
    Struct(StructType),
    /// String-keyed map; holds the value shape.
    Map(fn() -> TypeInfo),
    Seq(fn() -> TypeInfo),
    /// Nullable pointer; holds the pointee shape.
    Option(fn() -> TypeInfo),
    /// Any plain value (`serde_json::Value`).
    Any,
    /// The dynamic [`Value`] itself.
    Value,
}

impl TypeInfo {
    pub fn of<T: Typed>() -> TypeInfo {
        T::type_info()
    }

    /// Value kind this shape expects, looking through pointers.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            TypeInfo::Bool => Some(Kind::Bool),
            TypeInfo::Int => Some(Kind::Int),
            TypeInfo::Float => Some(Kind::Float),
            TypeInfo::String => Some(Kind::String),
            TypeInfo::Struct(_) | TypeInfo::Map(_) => Some(Kind::Map),
            TypeInfo::Seq(_) => Some(Kind::Sequence),
            TypeInfo::Option(inner) => inner().kind(),
            TypeInfo::Any | TypeInfo::Value => None,
        }
    }

    /// The record behind this shape, looking through pointers.
    pub fn as_struct(&self) -> Option<StructType> {
        match self {
            TypeInfo::Struct(st) => Some(*st),
            TypeInfo::Option(inner) => inner().as_struct(),
            _ => None,
        }
    }
}

/// A record type: its identity and its declared fields.
#[derive(Debug, Clone, Copy)]
pub struct StructType {
    pub id: TypeId,
    pub info: &'static StructInfo,
}

impl StructType {
    pub fn of<T: ?Sized + 'static>(info: &'static StructInfo) -> Self {
        Self {
            id: TypeId::of::<T>(),
            info,
        }
    }
}

/// Field declarations of a record, in declaration order.
#[derive(Debug)]
pub struct StructInfo {
    pub name: &'static str,
    pub fields: &'static [FieldInfo],
}

#[derive(Debug)]
pub struct FieldInfo {
    /// Rust field name.
    pub ident: &'static str,
    /// External name in the dynamic representation.
    pub name: &'static str,
    /// Zero values are dropped when lowering.
    pub omit_empty: bool,
    /// The field is a record (or pointer to one) whose fields are promoted.
    pub flatten: bool,
    pub ty: fn() -> TypeInfo,
}

/// A type the engine can lower from and raise into.
pub trait Typed {
    fn type_info() -> TypeInfo
    where
        Self: Sized;

    fn reflect(&self) -> TypedRef<'_>;

    fn reflect_mut(&mut self) -> TypedMut<'_>;
}

/// Read view of a [`Typed`] value.
pub enum TypedRef<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(&'a str),
    Struct(&'a dyn Struct),
    /// Entries sorted by key for unordered maps.
    Map(Vec<(&'a str, &'a dyn Typed)>),
    Seq(Vec<&'a dyn Typed>),
    Option(Option<&'a dyn Typed>),
    Any(&'a serde_json::Value),
    Value(&'a Value),
}

/// Write view of a [`Typed`] value.
pub enum TypedMut<'a> {
    Bool(&'a mut bool),
    Int(&'a mut dyn IntSlot),
    Float(&'a mut dyn FloatSlot),
    String(&'a mut String),
    Struct(&'a mut dyn Struct),
    Map(&'a mut dyn MapSlot),
    Seq(&'a mut dyn SeqSlot),
    Option(&'a mut dyn OptionSlot),
    Any(&'a mut serde_json::Value),
    Value(&'a mut Value),
}

/// Field access for records, implemented by `#[derive(Typed)]`.
///
/// Field indices follow [`StructInfo::fields`].
pub trait Struct {
    fn struct_type(&self) -> StructType;

    fn field(&self, index: usize) -> Option<&dyn Typed>;

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Typed>;

    /// Reset every field to its zero value.
    fn zero(&mut self);
}

pub trait IntSlot {
    /// Store `value`; false if it does not fit.
    fn set_int(&mut self, value: i64) -> bool;

    fn type_name(&self) -> &'static str;
}

pub trait FloatSlot {
    /// Store `value`; false if it does not fit.
    fn set_float(&mut self, value: f64) -> bool;

    fn type_name(&self) -> &'static str;
}

pub trait MapSlot {
    fn clear_entries(&mut self);

    /// Insert a zero value under `key` and return it for population.
    fn insert_default(&mut self, key: String) -> &mut dyn Typed;
}

pub trait SeqSlot {
    fn clear_items(&mut self);

    /// Append a zero value and return it for population.
    fn push_default(&mut self) -> &mut dyn Typed;
}

pub trait OptionSlot {
    fn set_none(&mut self);

    /// Allocate the pointee if absent.
    fn get_or_insert_default(&mut self) -> &mut dyn Typed;
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl Typed for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::Bool
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Bool(*self)
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Bool(self)
    }
}

impl Typed for String {
    fn type_info() -> TypeInfo {
        TypeInfo::String
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::String(self)
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::String(self)
    }
}

// u64 and usize have no lossless mapping onto i64 and are left out.
macro_rules! impl_int {
    ($($t:ty),*) => {$(
        impl Typed for $t {
            fn type_info() -> TypeInfo {
                TypeInfo::Int
            }

            fn reflect(&self) -> TypedRef<'_> {
                TypedRef::Int(i64::from(*self))
            }

            fn reflect_mut(&mut self) -> TypedMut<'_> {
                TypedMut::Int(self)
            }
        }

        impl IntSlot for $t {
            fn set_int(&mut self, value: i64) -> bool {
                match <$t>::try_from(value) {
                    Ok(v) => {
                        *self = v;
                        true
                    }
                    Err(_) => false,
                }
            }

            fn type_name(&self) -> &'static str {
                stringify!($t)
            }
        }
    )*};
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);

impl Typed for f64 {
    fn type_info() -> TypeInfo {
        TypeInfo::Float
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Float(*self)
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Float(self)
    }
}

impl FloatSlot for f64 {
    fn set_float(&mut self, value: f64) -> bool {
        *self = value;
        true
    }

    fn type_name(&self) -> &'static str {
        "f64"
    }
}

impl Typed for f32 {
    fn type_info() -> TypeInfo {
        TypeInfo::Float
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Float(f64::from(*self))
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Float(self)
    }
}

impl FloatSlot for f32 {
    fn set_float(&mut self, value: f64) -> bool {
        if value.is_finite() && value.abs() > f64::from(f32::MAX) {
            return false;
        }
        *self = value as f32;
        true
    }

    fn type_name(&self) -> &'static str {
        "f32"
    }
}

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

impl<T: Typed + Default> Typed for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Option(T::type_info)
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Option(self.as_ref().map(|v| v as &dyn Typed))
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Option(self)
    }
}

impl<T: Typed + Default> OptionSlot for Option<T> {
    fn set_none(&mut self) {
        *self = None;
    }

    fn get_or_insert_default(&mut self) -> &mut dyn Typed {
        self.get_or_insert_with(T::default)
    }
}

impl<T: Typed> Typed for Box<T> {
    fn type_info() -> TypeInfo {
        T::type_info()
    }

    fn reflect(&self) -> TypedRef<'_> {
        (**self).reflect()
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        (**self).reflect_mut()
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

impl<T: Typed + Default> Typed for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Seq(T::type_info)
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Seq(self.iter().map(|v| v as &dyn Typed).collect())
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Seq(self)
    }
}

impl<T: Typed + Default> SeqSlot for Vec<T> {
    fn clear_items(&mut self) {
        self.clear();
    }

    fn push_default(&mut self) -> &mut dyn Typed {
        let index = self.len();
        self.push(T::default());
        &mut self[index]
    }
}

impl<T: Typed + Default> Typed for HashMap<String, T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Map(T::type_info)
    }

    fn reflect(&self) -> TypedRef<'_> {
        let mut entries: Vec<(&str, &dyn Typed)> = self
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn Typed))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        TypedRef::Map(entries)
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Map(self)
    }
}

impl<T: Typed + Default> MapSlot for HashMap<String, T> {
    fn clear_entries(&mut self) {
        self.clear();
    }

    fn insert_default(&mut self, key: String) -> &mut dyn Typed {
        self.entry(key).or_default()
    }
}

impl<T: Typed + Default> Typed for BTreeMap<String, T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Map(T::type_info)
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Map(self.iter().map(|(k, v)| (k.as_str(), v as &dyn Typed)).collect())
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Map(self)
    }
}

impl<T: Typed + Default> MapSlot for BTreeMap<String, T> {
    fn clear_entries(&mut self) {
        self.clear();
    }

    fn insert_default(&mut self, key: String) -> &mut dyn Typed {
        self.entry(key).or_default()
    }
}

// ---------------------------------------------------------------------------
// Dynamic values
// ---------------------------------------------------------------------------

impl Typed for serde_json::Value {
    fn type_info() -> TypeInfo {
        TypeInfo::Any
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Any(self)
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Any(self)
    }
}

impl Typed for Value {
    fn type_info() -> TypeInfo {
        TypeInfo::Value
    }

    fn reflect(&self) -> TypedRef<'_> {
        TypedRef::Value(self)
    }

    fn reflect_mut(&mut self) -> TypedMut<'_> {
        TypedMut::Value(self)
    }
}

/// Field reached by following `steps` from `root`, stepping through
/// flattened records and their pointers. `None` if a pointer on the way is null.
pub(crate) fn field_at<'a>(root: &'a dyn Struct, steps: &[usize]) -> Option<&'a dyn Typed> {
    let (last, prefix) = steps.split_last()?;
    let mut current = root;
    for &step in prefix {
        let mut field = current.field(step)?;
        current = loop {
            match field.reflect() {
                TypedRef::Option(Some(inner)) => field = inner,
                TypedRef::Struct(s) => break s,
                _ => return None,
            }
        };
    }
    current.field(*last)
}

/// Mutable counterpart of [`field_at`]; null pointers on the way are allocated.
pub(crate) fn field_at_mut<'a>(
    root: &'a mut dyn Struct,
    steps: &[usize],
) -> Option<&'a mut dyn Typed> {
    let (last, prefix) = steps.split_last()?;
    let mut current = root;
    for &step in prefix {
        let mut field = current.field_mut(step)?;
        current = loop {
            match field.reflect_mut() {
                TypedMut::Option(slot) => field = slot.get_or_insert_default(),
                TypedMut::Struct(s) => break s,
                _ => return None,
            }
        };
    }
    current.field_mut(*last)
}
