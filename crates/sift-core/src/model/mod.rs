//! Runtime entity schema.
//!
//! Entities are described by static `EntityModel` tables. Relations point at
//! other static models, so nested attribute paths can be navigated without any
//! reflection. The path resolver lives in `path`.
pub mod entity;
pub mod field;
pub mod path;

pub use entity::EntityModel;
pub use field::{FieldKind, FieldModel};
pub use path::{AttributeHandle, AttributePath, ResolveError, resolve};
