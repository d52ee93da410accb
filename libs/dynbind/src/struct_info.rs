use std::any::TypeId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use crate::reflect::{FieldInfo, StructType, TypeInfo};

/// Resolved field of a record, possibly promoted from a flattened record.
#[derive(Debug)]
pub(crate) struct FieldPath {
    /// Field indices from the outer record down to the field itself.
    pub steps: Vec<usize>,
    pub info: &'static FieldInfo,
}

/// Cached per-type view of a record's fields.
#[derive(Debug)]
pub(crate) struct StructMeta {
    pub name: &'static str,
    /// External names in declaration order, flattened records expanded in place.
    pub order: Vec<&'static str>,
    pub fields: HashMap<&'static str, FieldPath>,
    /// Fields without `omit_empty`.
    pub always_include: HashSet<&'static str>,
    /// Field receiving the whole value the record was raised from.
    pub value_field: Option<Vec<usize>>,
}

impl StructMeta {
    pub fn field(&self, name: &str) -> Option<&FieldPath> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldPath)> {
        self.order.iter().map(|&name| (name, &self.fields[name]))
    }

    pub fn always_include(&self, name: &str) -> bool {
        self.always_include.contains(name)
    }
}

static CACHE: LazyLock<Mutex<HashMap<TypeId, Arc<StructMeta>>>> = LazyLock::new(Default::default);

fn cache() -> MutexGuard<'static, HashMap<TypeId, Arc<StructMeta>>> {
    // Entries are complete before insertion, so a poisoned map is still consistent.
    CACHE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Metadata for `ty`, built on first use.
///
/// Concurrent first use may build the same metadata twice; the first
/// insertion wins.
pub(crate) fn struct_meta(ty: StructType) -> Arc<StructMeta> {
    if let Some(meta) = cache().get(&ty.id) {
        return Arc::clone(meta);
    }
    let meta = Arc::new(build(ty));
    tracing::debug!(
        r#type = meta.name,
        fields = meta.order.len(),
        value_field = meta.value_field.is_some(),
        "built struct metadata"
    );
    Arc::clone(cache().entry(ty.id).or_insert(meta))
}

/// Walk `ty` breadth-first so that shallower fields claim names first.
///
/// Panics on authoring errors in the record declarations: more than one
/// value capture field, a flattened non-record, or a record flattened
/// into itself.
fn build(ty: StructType) -> StructMeta {
    let mut fields: HashMap<&'static str, FieldPath> = HashMap::new();
    let mut value_field: Option<Vec<usize>> = None;

    let mut queue = VecDeque::from([(Vec::new(), ty, vec![ty.id])]);
    while let Some((prefix, current, lineage)) = queue.pop_front() {
        for (i, field) in current.info.fields.iter().enumerate() {
            let mut steps = prefix.clone();
            steps.push(i);

            let field_ty = (field.ty)();
            if field.flatten {
                let inner = flattened(ty, current, field, field_ty);
                if lineage.contains(&inner.id) {
                    panic!(
                        "{}: field `{}` flattens `{}` into itself",
                        ty.info.name, field.ident, inner.info.name
                    );
                }
                let mut lineage = lineage.clone();
                lineage.push(inner.id);
                queue.push_back((steps, inner, lineage));
                continue;
            }

            if matches!(field_ty, TypeInfo::Value) {
                if value_field.is_some() {
                    panic!(
                        "{}: more than one value capture field (second is `{}.{}`)",
                        ty.info.name, current.info.name, field.ident
                    );
                }
                value_field = Some(steps);
                continue;
            }

            fields
                .entry(field.name)
                .or_insert(FieldPath { steps, info: field });
        }
    }

    let mut order = Vec::with_capacity(fields.len());
    collect_order(ty, &[], &fields, &mut order);

    let always_include = fields
        .iter()
        .filter(|(_, path)| !path.info.omit_empty)
        .map(|(&name, _)| name)
        .collect();

    StructMeta {
        name: ty.info.name,
        order,
        fields,
        always_include,
        value_field,
    }
}

fn flattened(
    root: StructType,
    current: StructType,
    field: &FieldInfo,
    field_ty: TypeInfo,
) -> StructType {
    match field_ty.as_struct() {
        Some(inner) => inner,
        None => panic!(
            "{}: flattened field `{}.{}` is not a record",
            root.info.name, current.info.name, field.ident
        ),
    }
}

/// Depth-first pass producing declaration order; only the winning path of
/// each name contributes.
fn collect_order(
    current: StructType,
    prefix: &[usize],
    fields: &HashMap<&'static str, FieldPath>,
    order: &mut Vec<&'static str>,
) {
    for (i, field) in current.info.fields.iter().enumerate() {
        let mut steps = prefix.to_vec();
        steps.push(i);
        let field_ty = (field.ty)();
        if field.flatten {
            if let Some(inner) = field_ty.as_struct() {
                collect_order(inner, &steps, fields, order);
            }
            continue;
        }
        if let Some(path) = fields.get(field.name) {
            if path.steps == steps {
                order.push(field.name);
            }
        }
    }
}
