use thiserror::Error;

use super::{CodecError, RepositoryError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid hashid: {0}")]
    InvalidEncoding(String),

    /// The row was inserted but writing its hashid failed; storage holds it unassigned
    #[error("Hashid assignment failed for key {id}: {source}")]
    PartialAssignment {
        id: i64,
        #[source]
        source: RepositoryError,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Codec(CodecError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CodecError> for ServiceError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidEncoding(value) => ServiceError::InvalidEncoding(value),
            other => ServiceError::Codec(other),
        }
    }
}
