//! ORMQL Core - filter, ordering and projection compilers.
//!
//! This crate binds GraphQL list-field arguments to an entity catalog: it
//! resolves property paths, compiles `where` trees into predicates and
//! `orderBy` lists into comparators, applies paging, and builds cached
//! projections that read only the requested fields.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod projection;
pub mod query;
pub mod row_filter;

pub use catalog::{EntityDef, FieldDef, FieldType, InterfaceDef, ScalarType, Schema, Visibility};
pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use entity::{Entity, FieldValue};
pub use error::Error;
pub use projection::{
    extract_property_paths, FieldProjectionInfo, NavigationProjectionInfo, Projection,
    ProjectionBuilder, SelectExpr, Selection,
};
pub use query::{
    ArgumentProcessor, Comparator, PathResolver, Predicate, PredicateCompiler, PropertyAccessor,
    SortCompiler, SortStrategy,
};
pub use row_filter::{RowFilter, RowFilters};

/// Re-export protocol types.
pub use ormql_proto as proto;
