//! Derives the active user's registration, admin and voting status.

use tracing::debug;

use election_chain::{ChainError, ChainReader, WalletProvider};
use election_types::{Address, RegistrationState, UserStatus};

pub struct UserStatusResolver<P> {
    reader: ChainReader<P>,
}

impl<P: WalletProvider> UserStatusResolver<P> {
    pub fn new(reader: ChainReader<P>) -> Self {
        Self { reader }
    }

    /// Read the status of `address`.
    ///
    /// The registration flag and the contract owner are independent and are
    /// read together. Approval is only read for a registered voter, and the
    /// vote flag only for an approved one.
    pub async fn resolve(&self, address: Address) -> Result<UserStatus, ChainError> {
        let (registered, owner) = tokio::try_join!(
            self.reader.voter_is_registered(address),
            self.reader.owner(),
        )?;
        let is_admin = owner == address;

        let registration = if !registered {
            RegistrationState::PendingRegistration
        } else if self.reader.registration_is_approved(address).await? {
            let has_voted = self.reader.voter_has_voted(address).await?;
            RegistrationState::Approved { has_voted }
        } else {
            RegistrationState::PendingApproval
        };

        debug!(%address, is_admin, ?registration, "user status resolved");
        Ok(UserStatus {
            address,
            is_admin,
            registration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use election_chain::{methods, ElectionAbi};
    use election_nullables::NullProvider;

    const OWNER: Address = Address::new([0x0a; 20]);
    const VOTER: Address = Address::new([0x7e; 20]);

    fn resolver(provider: &Arc<NullProvider>) -> UserStatusResolver<NullProvider> {
        UserStatusResolver::new(ChainReader::new(
            Arc::clone(provider),
            NullProvider::CONTRACT,
            Arc::new(ElectionAbi::embedded().unwrap()),
        ))
    }

    #[tokio::test]
    async fn unregistered_stops_after_two_reads() {
        let provider = Arc::new(NullProvider::new(OWNER));
        let status = resolver(&provider).resolve(VOTER).await.unwrap();

        assert_eq!(status.registration, RegistrationState::PendingRegistration);
        assert!(!status.is_admin);
        assert_eq!(status.has_voted(), None);
        let mut reads = provider.reads();
        reads.sort();
        assert_eq!(reads, vec![methods::OWNER, methods::VOTER_IS_REGISTERED]);
    }

    #[tokio::test]
    async fn registered_but_unapproved_is_pending_approval() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.seed_registered(VOTER);
        let status = resolver(&provider).resolve(VOTER).await.unwrap();

        assert_eq!(status.registration, RegistrationState::PendingApproval);
        assert!(!provider
            .reads()
            .iter()
            .any(|m| m == methods::VOTER_HAS_VOTED));
    }

    #[tokio::test]
    async fn approved_voter_reports_vote_flag() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.seed_approved(VOTER);
        let status = resolver(&provider).resolve(VOTER).await.unwrap();
        assert_eq!(
            status.registration,
            RegistrationState::Approved { has_voted: false }
        );
        assert!(status.can_vote());

        provider.seed_voted(VOTER);
        let status = resolver(&provider).resolve(VOTER).await.unwrap();
        assert_eq!(status.has_voted(), Some(true));
        assert!(!status.can_vote());
    }

    #[tokio::test]
    async fn owner_is_admin_even_when_unregistered() {
        let provider = Arc::new(NullProvider::new(OWNER));
        let status = resolver(&provider).resolve(OWNER).await.unwrap();
        assert!(status.is_admin);
        assert_eq!(status.registration, RegistrationState::PendingRegistration);
    }

    #[tokio::test]
    async fn failed_read_aborts_resolution() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.seed_registered(VOTER);
        provider.fail_reads_of(
            methods::REGISTRATION_IS_APPROVED,
            ChainError::Transport("connection reset".into()),
        );
        let err = resolver(&provider).resolve(VOTER).await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
    }
}
