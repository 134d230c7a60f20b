//! Argument error types.

use thiserror::Error;

/// Errors raised while interpreting already-deserialized query arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two paging styles were supplied on the same request.
    #[error("conflicting paging arguments: {0}")]
    ConflictingPaging(String),

    /// A paging argument is incomplete or out of range.
    #[error("invalid paging arguments: {0}")]
    InvalidPaging(String),
}
