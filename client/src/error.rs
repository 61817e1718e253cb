use thiserror::Error;

use election_chain::ChainError;
use election_types::TypesError;
use election_utils::LoggingError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No contract is bound or no account is active.
    #[error("not connected: please connect a wallet")]
    NotConnected,

    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] TypesError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
}
