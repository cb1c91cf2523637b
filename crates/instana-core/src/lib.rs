//! core state tree, schema and tag-filter primitives for the instana provider.

pub mod naming;
pub mod schema;
pub mod tagfilter;
pub mod value;

pub use naming::ResourceNameFormatter;
pub use schema::{
    DiffSuppressFn, Element, FieldError, FieldKind, FieldSchema, Schema, SetHash, StateError,
    StateFn, Validator,
};
pub use value::{StateMap, StateMapExt, Value};
