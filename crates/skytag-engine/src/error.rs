use skytag_dsl::{CoerceError, TokenError};
use skytag_model::ResolveError;
use thiserror::Error;

/// Fatal tagging failures. An empty selection at a mutation is not one of
/// these: it is reported and skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TagError {
    #[error(transparent)]
    MalformedSelection(#[from] TokenError),

    #[error(transparent)]
    UnparseableValue(#[from] CoerceError),

    #[error(transparent)]
    UnresolvedPath(#[from] ResolveError),
}

impl TagError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            TagError::MalformedSelection(_) | TagError::UnparseableValue(_) => 2,
            TagError::UnresolvedPath(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, TagError>;
