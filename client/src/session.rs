//! The wallet context every read and transaction runs against.

use std::sync::Arc;

use tokio::sync::RwLock;

use election_types::Address;

use crate::ClientError;

/// Session shared between the coordinator and the orchestrator.
pub type SharedSession = Arc<RwLock<Session>>;

/// Which contract the client talks to and which account it acts as.
///
/// Either binding may be absent. Reads need a contract; transactions need
/// both. The account is rebound on every refresh from whatever the provider
/// reports as active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    contract: Option<Address>,
    account: Option<Address>,
}

impl Session {
    pub fn connected(contract: Address, account: Option<Address>) -> Self {
        Self {
            contract: Some(contract),
            account,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn contract(&self) -> Option<Address> {
        self.contract
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.contract.is_some() && self.account.is_some()
    }

    /// Bind `account` as the sender. Returns `true` if it differs from the previous one.
    pub fn bind_account(&mut self, account: Address) -> bool {
        self.account.replace(account) != Some(account)
    }

    pub fn clear_account(&mut self) {
        self.account = None;
    }

    pub fn disconnect(&mut self) {
        *self = Self::disconnected();
    }

    /// The bound contract, or [`ClientError::NotConnected`].
    pub fn require_contract(&self) -> Result<Address, ClientError> {
        self.contract.ok_or(ClientError::NotConnected)
    }

    /// Contract and sending account, or [`ClientError::NotConnected`] if either is missing.
    pub fn require(&self) -> Result<(Address, Address), ClientError> {
        match (self.contract, self.account) {
            (Some(contract), Some(account)) => Ok((contract, account)),
            _ => Err(ClientError::NotConnected),
        }
    }
}
