//! Core error types.

use ormql_proto::Comparison;
use thiserror::Error;

/// Errors raised while compiling or evaluating filters, orderings and
/// projections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The named entity type is not in the schema.
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// The schema references something it does not define.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A path segment does not name a reachable member.
    #[error("cannot resolve '{path}' on {entity}: {reason} at '{segment}'")]
    PathResolution {
        /// Entity type the path was resolved against.
        entity: String,
        /// The full dotted path.
        path: String,
        /// The offending segment.
        segment: String,
        /// Why the segment failed.
        reason: String,
    },

    /// The operator is not valid for the target property type.
    #[error("comparison {comparison:?} is not supported on {kind} property '{path}'")]
    UnsupportedComparison {
        /// Property path of the leaf.
        path: String,
        /// The rejected operator.
        comparison: Comparison,
        /// Type of the target property.
        kind: String,
    },

    /// Wrong number of operands for the operator.
    #[error("comparison {comparison:?} on '{path}' expects {expected} value(s), got {count}")]
    InvalidValueCount {
        /// Property path of the leaf.
        path: String,
        /// The operator.
        comparison: Comparison,
        /// Description of the expected count.
        expected: &'static str,
        /// Number of operands supplied.
        count: usize,
    },

    /// An operand could not be converted to the property type.
    #[error("cannot convert '{value}' to {target}")]
    Conversion {
        /// The raw operand.
        value: String,
        /// The target type name.
        target: String,
    },

    /// A query argument is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Argument error from the proto layer.
    #[error(transparent)]
    Arguments(#[from] ormql_proto::Error),
}
