//! Read-only calls against the bound election contract.

use std::sync::Arc;

use ethabi::{Token, Uint};
use tracing::debug;

use election_types::{Address, CandidateName};

use crate::abi::{methods, ElectionAbi};
use crate::error::ChainError;
use crate::provider::WalletProvider;

/// Issues view calls to one contract through a provider and decodes the results.
///
/// Every call goes to the provider; nothing is cached and nothing is retried.
pub struct ChainReader<P> {
    provider: Arc<P>,
    contract: Address,
    abi: Arc<ElectionAbi>,
}

impl<P> Clone for ChainReader<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            contract: self.contract,
            abi: Arc::clone(&self.abi),
        }
    }
}

impl<P: WalletProvider> ChainReader<P> {
    pub fn new(provider: Arc<P>, contract: Address, abi: Arc<ElectionAbi>) -> Self {
        Self {
            provider,
            contract,
            abi,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Call view method `method` with `args` and return its decoded outputs.
    pub async fn call(&self, method: &str, args: &[Token]) -> Result<Vec<Token>, ChainError> {
        let data = self.abi.encode_call(method, args)?;
        debug!(contract = %self.contract, method, "contract read");
        let output = self.provider.call(self.contract, data).await?;
        self.abi.decode_output(method, &output)
    }

    pub async fn voter_is_registered(&self, voter: Address) -> Result<bool, ChainError> {
        let out = self
            .call(methods::VOTER_IS_REGISTERED, &[address_token(voter)])
            .await?;
        single_bool(methods::VOTER_IS_REGISTERED, out)
    }

    pub async fn registration_is_approved(&self, voter: Address) -> Result<bool, ChainError> {
        let out = self
            .call(methods::REGISTRATION_IS_APPROVED, &[address_token(voter)])
            .await?;
        single_bool(methods::REGISTRATION_IS_APPROVED, out)
    }

    pub async fn voter_has_voted(&self, voter: Address) -> Result<bool, ChainError> {
        let out = self
            .call(methods::VOTER_HAS_VOTED, &[address_token(voter)])
            .await?;
        single_bool(methods::VOTER_HAS_VOTED, out)
    }

    pub async fn owner(&self) -> Result<Address, ChainError> {
        let out = self.call(methods::OWNER, &[]).await?;
        match single(methods::OWNER, out)? {
            Token::Address(addr) => Ok(Address::new(addr.to_fixed_bytes())),
            other => Err(unexpected(methods::OWNER, "address", &other)),
        }
    }

    pub async fn candidate_count(&self) -> Result<u64, ChainError> {
        let out = self.call(methods::GET_CANDIDATE_COUNT, &[]).await?;
        single_u64(methods::GET_CANDIDATE_COUNT, out)
    }

    /// The raw bytes32 name stored at `index`.
    pub async fn candidate_name_at(&self, index: u64) -> Result<CandidateName, ChainError> {
        let out = self
            .call(
                methods::GET_CANDIDATE_NAME_FOR_INDEX,
                &[Token::Uint(Uint::from(index))],
            )
            .await?;
        match single(methods::GET_CANDIDATE_NAME_FOR_INDEX, out)? {
            Token::FixedBytes(bytes) if bytes.len() == CandidateName::LEN => {
                let mut raw = [0u8; 32];
                raw.copy_from_slice(&bytes);
                Ok(CandidateName::from_raw(raw))
            }
            other => Err(unexpected(
                methods::GET_CANDIDATE_NAME_FOR_INDEX,
                "bytes32",
                &other,
            )),
        }
    }

    /// Votes recorded under the raw bytes32 key `name`.
    pub async fn vote_count_for(&self, name: &CandidateName) -> Result<u64, ChainError> {
        let out = self
            .call(methods::GET_VOTE_COUNT_FOR_CANDIDATE, &[name_token(name)])
            .await?;
        single_u64(methods::GET_VOTE_COUNT_FOR_CANDIDATE, out)
    }
}

pub fn address_token(address: Address) -> Token {
    Token::Address(ethabi::Address::from(*address.as_bytes()))
}

pub fn name_token(name: &CandidateName) -> Token {
    Token::FixedBytes(name.as_bytes().to_vec())
}

fn single(method: &str, mut out: Vec<Token>) -> Result<Token, ChainError> {
    if out.len() != 1 {
        return Err(ChainError::Decode {
            method: method.to_string(),
            detail: format!("expected one return value, got {}", out.len()),
        });
    }
    Ok(out.remove(0))
}

fn single_bool(method: &str, out: Vec<Token>) -> Result<bool, ChainError> {
    match single(method, out)? {
        Token::Bool(value) => Ok(value),
        other => Err(unexpected(method, "bool", &other)),
    }
}

fn single_u64(method: &str, out: Vec<Token>) -> Result<u64, ChainError> {
    match single(method, out)? {
        Token::Uint(value) if value.bits() <= 64 => Ok(value.low_u64()),
        Token::Uint(value) => Err(ChainError::Decode {
            method: method.to_string(),
            detail: format!("{value} does not fit in u64"),
        }),
        other => Err(unexpected(method, "uint256", &other)),
    }
}

fn unexpected(method: &str, expected: &str, got: &Token) -> ChainError {
    ChainError::Decode {
        method: method.to_string(),
        detail: format!("expected {expected}, got {got:?}"),
    }
}
