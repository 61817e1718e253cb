use thiserror::Error;

use crate::provider::TxHash;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("unexpected output from {method}: {detail}")]
    Decode { method: String, detail: String },

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("provider has no active account")]
    NoAccount,

    #[error("transaction outcome was dropped before it settled")]
    Abandoned,

    #[error(transparent)]
    Types(#[from] election_types::TypesError),
}

impl From<ethabi::Error> for ChainError {
    fn from(e: ethabi::Error) -> Self {
        ChainError::Abi(e.to_string())
    }
}
