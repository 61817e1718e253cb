//! Chain access for the election client.
//!
//! - [`abi`]: the embedded election contract ABI and call encoding.
//! - [`provider`]: the [`WalletProvider`] transport seam, transaction requests and receipts.
//! - [`rpc`]: an Ethereum JSON-RPC implementation of the provider over HTTP.
//! - [`reader`]: [`ChainReader`], typed read-only calls against a bound contract.
//!
//! Nothing here caches or retries: every call goes to the provider and every
//! failure is returned to the caller unchanged.

pub mod abi;
pub mod error;
pub mod provider;
pub mod reader;
pub mod rpc;

pub use abi::{methods, ElectionAbi};
pub use error::ChainError;
pub use provider::{wait_for_receipt, TransactionReceipt, TransactionRequest, TxHash, WalletProvider};
pub use reader::{address_token, name_token, ChainReader};
pub use rpc::JsonRpcProvider;

pub use ethabi::Token;
