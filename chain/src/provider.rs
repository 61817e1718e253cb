//! The wallet provider seam.
//!
//! A [`WalletProvider`] is whatever stands between the client and the chain:
//! it knows the active account, executes view calls, accepts transactions for
//! signing and sending, and reports receipts. Signing keys never pass through
//! this crate.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use election_types::Address;

use crate::error::ChainError;

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| ChainError::InvalidResponse(format!("transaction hash {s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash(0x{})", hex::encode(&self.0[..4]))
    }
}

/// A mutating contract call, to be signed and sent by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Confirmation data for a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    /// `false` when execution reverted.
    pub status: bool,
}

/// Upstream wallet/provider transport.
pub trait WalletProvider: Send + Sync + 'static {
    /// The account transactions are sent from (`eth_coinbase`).
    fn coinbase(&self) -> impl Future<Output = Result<Address, ChainError>> + Send;

    /// Execute a view call against `to` and return the raw output (`eth_call`).
    fn call(
        &self,
        to: Address,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, ChainError>> + Send;

    /// Hand a transaction to the wallet for signing and broadcast (`eth_sendTransaction`).
    fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    /// The receipt for `hash`, or `None` while it is still pending.
    fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<TransactionReceipt>, ChainError>> + Send;
}

/// Poll for the receipt of `hash` until it is mined.
///
/// There is no upper bound on the wait. A reverted receipt is returned as
/// [`ChainError::Reverted`]; provider errors end the wait immediately.
pub async fn wait_for_receipt<P: WalletProvider>(
    provider: &P,
    hash: TxHash,
    poll_interval: Duration,
) -> Result<TransactionReceipt, ChainError> {
    let mut polls = 0u64;
    loop {
        polls += 1;
        if let Some(receipt) = provider.transaction_receipt(hash).await? {
            tracing::debug!(tx = %hash, polls, status = receipt.status, "receipt received");
            if !receipt.status {
                return Err(ChainError::Reverted(hash));
            }
            return Ok(receipt);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_hash_parses_with_and_without_prefix() {
        let hex = "3e8073efc8951034bcf6b0888be845983998a8898d541e9a58f57b09d77af806";
        let a: TxHash = format!("0x{hex}").parse().unwrap();
        let b: TxHash = hex.parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), format!("0x{hex}"));
    }

    #[test]
    fn tx_hash_rejects_short_input() {
        assert!("0x1234".parse::<TxHash>().is_err());
    }
}
