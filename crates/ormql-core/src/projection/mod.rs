//! Projections: reading only what a query needs.
//!
//! The analyzer discovers which paths a selection reads, the info types
//! describe a requested field tree, and the builder compiles that tree into
//! a cached [`Projection`].

mod analyzer;
mod builder;
mod expr;
mod info;

pub use analyzer::extract_property_paths;
pub use builder::{Projection, ProjectionBuilder};
pub use expr::{SelectExpr, Selection};
pub use info::{FieldProjectionInfo, NavigationProjectionInfo};
