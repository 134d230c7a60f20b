//! Query compilation for ORMQL.
//!
//! This module turns the GraphQL argument model into executable pieces:
//! property accessors, filter predicates, comparators and paging, and
//! applies them to an in-memory source.

mod accessor;
mod arguments;
mod convert;
mod filter;
mod sort;

pub use accessor::{PathResolver, PropertyAccessor};
pub use arguments::{apply_paging, ArgumentProcessor};
pub use convert::{convert_operand, parse_scalar, parse_uuid};
pub use filter::{like_match, Predicate, PredicateCompiler};
pub use sort::{Comparator, SortCompiler, SortStrategy};
