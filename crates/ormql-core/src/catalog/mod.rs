//! Entity catalog.
//!
//! The catalog describes every mapped type: its fields, keys, foreign keys,
//! navigations and the interfaces it implements.

mod entity;
mod field;
mod schema;
mod types;

pub use entity::{EntityDef, InterfaceDef};
pub use field::{FieldDef, Visibility};
pub use schema::Schema;
pub use types::{FieldType, ScalarType};
