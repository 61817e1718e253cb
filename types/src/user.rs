//! The current user's status as derived from the contract.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Where the user stands in the voter registration flow.
///
/// `has_voted` only exists once registration is approved; the contract's
/// vote flag is never read for an unapproved voter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum RegistrationState {
    /// The address has not called `registerVoter` yet.
    PendingRegistration,
    /// Registered, waiting for the owner to approve.
    PendingApproval,
    Approved {
        #[serde(rename = "hasVoted")]
        has_voted: bool,
    },
}

impl RegistrationState {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// The vote flag, or `None` when registration is not approved.
    pub fn has_voted(&self) -> Option<bool> {
        match self {
            Self::Approved { has_voted } => Some(*has_voted),
            _ => None,
        }
    }
}

/// Registration, admin and voting status of one address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub address: Address,
    /// Whether the address owns the contract.
    pub is_admin: bool,
    pub registration: RegistrationState,
}

impl UserStatus {
    pub fn has_voted(&self) -> Option<bool> {
        self.registration.has_voted()
    }

    /// Approved and not voted yet.
    pub fn can_vote(&self) -> bool {
        self.registration.has_voted() == Some(false)
    }
}
