//! Errors raised while parsing or encoding fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("candidate name must not be empty")]
    EmptyName,

    #[error("candidate name is {len} bytes, at most {max} fit in a bytes32")]
    NameTooLong { len: usize, max: usize },

    #[error("candidate name contains a NUL character")]
    NameContainsNul,

    #[error("bytes32 value is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}
