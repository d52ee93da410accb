//! Dynamic configuration values and typed bindings.
//!
//! Configuration is represented as a tree of [`Value`]s that remember where
//! each node was read from. Records declared with `#[derive(Typed)]` are
//! bound to and from such trees:
//!
//! - [`normalize`] checks a tree against a record type, coercing scalars
//!   where that loses nothing and reporting every problem as a [`Diagnostic`].
//! - [`raise`] populates a record from a tree.
//! - [`lower`] turns a record back into a tree, reusing the nodes of a
//!   reference tree wherever the content did not change.

extern crate self as dynbind;

pub mod diag;
pub mod error;
mod from_typed;
pub mod location;
pub mod mapping;
mod normalize;
pub mod path;
pub mod placeholder;
pub mod reflect;
mod scalar;
mod struct_info;
mod to_typed;
pub mod value;

pub use dynbind_derive::Typed;

pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use from_typed::lower;
pub use location::Location;
pub use mapping::{Key, Mapping, Pair};
pub use normalize::{normalize, normalize_type, normalize_with, NormalizeOptions};
pub use path::{Path, PathElement};
pub use placeholder::{contains_variable_reference, is_pure_variable_reference};
pub use reflect::{Struct, TypeInfo, Typed};
pub use to_typed::raise;
pub use value::{Data, Kind, Value};
