//! ormql argument types.
//!
//! This crate defines the structured arguments a GraphQL list field hands to
//! the ormql core once the GraphQL layer has deserialized them.
//!
//! # Modules
//!
//! - [`value`] - Runtime scalar values
//! - [`filter`] - Filter expression trees for `where` arguments
//! - [`query`] - Ordering, paging and the combined argument set
//! - [`error`] - Argument error types
//!
//! # Serialization
//!
//! The argument types derive serde with camelCase field names so a host
//! framework can deserialize GraphQL variables directly:
//!
//! ```ignore
//! use ormql_proto::FilterExpression;
//!
//! let expr: FilterExpression =
//!     serde_json::from_str(r#"{"path": "Age", "comparison": "greaterThan", "value": ["30"]}"#)?;
//! ```

pub mod error;
pub mod filter;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use filter::{Comparison, Connector, FilterExpression, StringComparison};
pub use query::{OrderBy, Paging, QueryArguments};
pub use value::{format_uuid, Value};
