//! Mutating contract calls and their lifecycle.
//!
//! [`TransactionOrchestrator::submit`] checks the session and encodes the
//! call up front, so a disconnected client or a malformed argument fails
//! before anything reaches the provider. The send and the receipt wait run
//! on a spawned task that settles the returned [`TransactionHandle`] exactly
//! once. Nothing is retried.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{info, warn};

use election_chain::{
    address_token, methods, name_token, wait_for_receipt, ChainError, ElectionAbi, Token,
    TransactionReceipt, TransactionRequest, WalletProvider,
};
use election_types::{Address, CandidateName, TypesError};

use crate::coordinator::SyncCoordinator;
use crate::metrics::ClientMetrics;
use crate::session::SharedSession;
use crate::ClientError;

/// A state-changing call on the election contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Cast the sender's vote.
    Vote { candidate: String },
    /// Owner only.
    Approve { voter: Address },
    /// Owner only; approves all of `voters` or none.
    BatchApprove { voters: Vec<Address> },
    /// Owner only.
    AddCandidate { name: String },
    /// Register the sender as a voter awaiting approval.
    RequestApproval,
}

impl Action {
    /// Contract method this action calls.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Vote { .. } => methods::VOTE_FOR_CANDIDATE,
            Self::Approve { .. } => methods::APPROVE_REGISTRATION,
            Self::BatchApprove { .. } => methods::APPROVE_REGISTRATIONS,
            Self::AddCandidate { .. } => methods::ADD_CANDIDATE,
            Self::RequestApproval => methods::REGISTER_VOTER,
        }
    }

    /// ABI arguments, with names encoded to bytes32.
    pub fn arguments(&self) -> Result<Vec<Token>, TypesError> {
        Ok(match self {
            Self::Vote { candidate } => vec![name_token(&CandidateName::encode(candidate)?)],
            Self::Approve { voter } => vec![address_token(*voter)],
            Self::BatchApprove { voters } => vec![Token::Array(
                voters.iter().copied().map(address_token).collect(),
            )],
            Self::AddCandidate { name } => vec![name_token(&CandidateName::encode(name)?)],
            Self::RequestApproval => Vec::new(),
        })
    }

    /// Whether a confirmed receipt changes what a refresh would read.
    fn refreshes_on_confirm(&self) -> bool {
        matches!(self, Self::AddCandidate { .. })
    }
}

/// One submitted transaction.
///
/// Resolves to the receipt once mined, or to the error that ended it. A
/// reverted transaction resolves to [`ChainError::Reverted`]. Dropping the
/// handle does not cancel the transaction.
#[derive(Debug)]
pub struct TransactionHandle {
    method: &'static str,
    outcome: oneshot::Receiver<Result<TransactionReceipt, ChainError>>,
}

impl TransactionHandle {
    pub fn method(&self) -> &'static str {
        self.method
    }
}

impl Future for TransactionHandle {
    type Output = Result<TransactionReceipt, ChainError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ChainError::Abandoned)))
    }
}

pub struct TransactionOrchestrator<P> {
    provider: Arc<P>,
    abi: Arc<ElectionAbi>,
    session: SharedSession,
    coordinator: SyncCoordinator<P>,
    poll_interval: Duration,
    metrics: Arc<ClientMetrics>,
}

impl<P: WalletProvider> TransactionOrchestrator<P> {
    pub fn new(
        provider: Arc<P>,
        abi: Arc<ElectionAbi>,
        session: SharedSession,
        coordinator: SyncCoordinator<P>,
        poll_interval: Duration,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            provider,
            abi,
            session,
            coordinator,
            poll_interval,
            metrics,
        }
    }

    /// Send `action` from the session account.
    ///
    /// Fails with [`ClientError::NotConnected`] when no contract or account is
    /// bound and with [`ClientError::InvalidArgument`] for an unencodable
    /// name, in both cases without any provider call.
    pub async fn submit(&self, action: Action) -> Result<TransactionHandle, ClientError> {
        let (contract, from) = self.session.read().await.require()?;
        let method = action.method();
        let data = self.abi.encode_call(method, &action.arguments()?)?;
        let request = TransactionRequest {
            from,
            to: contract,
            data,
        };

        let (settle, outcome) = oneshot::channel();
        let provider = Arc::clone(&self.provider);
        let metrics = Arc::clone(&self.metrics);
        let refresh = action.refreshes_on_confirm().then(|| self.coordinator.clone());
        let poll_interval = self.poll_interval;

        self.metrics.transactions_submitted.inc();
        tokio::spawn(async move {
            let result = send_and_confirm(&*provider, method, request, poll_interval).await;
            match &result {
                Ok(receipt) => {
                    metrics.transactions_confirmed.inc();
                    info!(
                        method,
                        tx = %receipt.transaction_hash,
                        block = ?receipt.block_number,
                        "transaction confirmed"
                    );
                    if let Some(coordinator) = refresh {
                        // A failed refresh is already logged and leaves the action confirmed.
                        let _ = coordinator.refresh().await;
                    }
                }
                Err(error) => {
                    metrics.transactions_failed.inc();
                    warn!(method, %error, "transaction failed");
                }
            }
            // The receiver may have been dropped; the transaction stands either way.
            let _ = settle.send(result);
        });

        Ok(TransactionHandle { method, outcome })
    }
}

async fn send_and_confirm<P: WalletProvider>(
    provider: &P,
    method: &'static str,
    request: TransactionRequest,
    poll_interval: Duration,
) -> Result<TransactionReceipt, ChainError> {
    let from = request.from;
    let hash = provider.send_transaction(request).await?;
    info!(method, %from, tx = %hash, "transaction submitted");
    wait_for_receipt(provider, hash, poll_interval).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use election_nullables::NullProvider;
    use tokio::sync::RwLock;

    use crate::session::Session;

    const OWNER: Address = Address::new([0x0a; 20]);
    const VOTER: Address = Address::new([0x7e; 20]);

    fn orchestrator(
        provider: &Arc<NullProvider>,
        session: Session,
    ) -> TransactionOrchestrator<NullProvider> {
        let abi = Arc::new(ElectionAbi::embedded().unwrap());
        let session = Arc::new(RwLock::new(session));
        let metrics = Arc::new(ClientMetrics::new());
        let coordinator = SyncCoordinator::new(
            Arc::clone(provider),
            Arc::clone(&abi),
            Arc::clone(&session),
            1,
            Arc::clone(&metrics),
        );
        TransactionOrchestrator::new(
            Arc::clone(provider),
            abi,
            session,
            coordinator,
            Duration::from_millis(1),
            metrics,
        )
    }

    #[test]
    fn actions_map_to_contract_methods() {
        assert_eq!(
            Action::Vote { candidate: "a".into() }.method(),
            "voteForCandidate"
        );
        assert_eq!(Action::RequestApproval.method(), "registerVoter");
        assert_eq!(
            Action::BatchApprove { voters: vec![] }.method(),
            "approveRegistrations"
        );
    }

    #[test]
    fn invalid_names_fail_to_encode() {
        let too_long = "x".repeat(33);
        assert!(Action::AddCandidate { name: too_long }.arguments().is_err());
        assert!(Action::Vote { candidate: String::new() }.arguments().is_err());
    }

    #[tokio::test]
    async fn request_approval_registers_the_sender() {
        let provider = Arc::new(NullProvider::new(OWNER));
        let orchestrator =
            orchestrator(&provider, Session::connected(NullProvider::CONTRACT, Some(VOTER)));

        let receipt = orchestrator
            .submit(Action::RequestApproval)
            .await
            .unwrap()
            .await
            .unwrap();
        assert!(receipt.status);
        assert!(provider.election().is_registered(&VOTER));
    }

    #[tokio::test]
    async fn waits_through_pending_polls() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.set_confirmation_polls(3);
        let orchestrator =
            orchestrator(&provider, Session::connected(NullProvider::CONTRACT, Some(VOTER)));

        orchestrator
            .submit(Action::RequestApproval)
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(provider.receipt_polls(), 4);
    }

    #[tokio::test]
    async fn send_failure_settles_the_handle_with_the_error() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.fail_sends(ChainError::Rpc {
            code: 4001,
            message: "user rejected the request".into(),
        });
        let orchestrator =
            orchestrator(&provider, Session::connected(NullProvider::CONTRACT, Some(VOTER)));

        let handle = orchestrator.submit(Action::RequestApproval).await.unwrap();
        assert_eq!(handle.method(), methods::REGISTER_VOTER);
        let err = handle.await.unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: 4001, .. }));
        assert_eq!(provider.receipt_polls(), 0);
    }

    #[tokio::test]
    async fn missing_account_is_rejected_before_any_call() {
        let provider = Arc::new(NullProvider::new(OWNER));
        let orchestrator =
            orchestrator(&provider, Session::connected(NullProvider::CONTRACT, None));

        let err = orchestrator
            .submit(Action::RequestApproval)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert_eq!(provider.network_calls(), 0);
    }

    #[tokio::test]
    async fn dropped_sender_reads_as_abandoned() {
        let (settle, outcome) = oneshot::channel();
        drop(settle);
        let handle = TransactionHandle {
            method: methods::VOTE_FOR_CANDIDATE,
            outcome,
        };
        assert!(matches!(handle.await, Err(ChainError::Abandoned)));
    }
}
