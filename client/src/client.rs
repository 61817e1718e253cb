//! The client facade: snapshot access, refresh, and the five actions.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use election_chain::{ChainError, ElectionAbi, JsonRpcProvider, WalletProvider};
use election_types::{Address, StateSnapshot};

use crate::config::ClientConfig;
use crate::coordinator::SyncCoordinator;
use crate::metrics::ClientMetrics;
use crate::orchestrator::{Action, TransactionHandle, TransactionOrchestrator};
use crate::session::{Session, SharedSession};
use crate::ClientError;

/// An election client bound to one wallet provider.
///
/// Consumers read [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe)
/// to changes, call [`refresh`](Self::refresh) to re-read the contract, and
/// submit actions that resolve through a [`TransactionHandle`].
pub struct ElectionClient<P: WalletProvider> {
    session: SharedSession,
    coordinator: SyncCoordinator<P>,
    orchestrator: TransactionOrchestrator<P>,
    metrics: Arc<ClientMetrics>,
}

impl ElectionClient<JsonRpcProvider> {
    /// Connect to the JSON-RPC endpoint in `config` and load the first snapshot.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let provider = JsonRpcProvider::with_timeouts(
            config.rpc_url.clone(),
            config.request_timeout(),
            config.connect_timeout(),
        )?;
        info!(url = %config.rpc_url, contract = %config.contract_address, "connecting");
        Self::connect_with(Arc::new(provider), config).await
    }
}

impl<P: WalletProvider> ElectionClient<P> {
    /// Bind the configured contract and the provider's active account, then
    /// run the initial refresh.
    ///
    /// A provider that cannot report an active account still yields a client:
    /// the session has no sender until a later refresh finds one. A failed
    /// initial refresh is logged and leaves the snapshot unloaded.
    pub async fn connect_with(provider: Arc<P>, config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let account = match provider.coinbase().await {
            Ok(account) => Some(account),
            Err(ChainError::NoAccount) => None,
            Err(error) => {
                warn!(%error, "could not read the active account");
                None
            }
        };
        let client = Self::build(
            provider,
            Session::connected(config.contract_address, account),
            config,
        )?;
        // The coordinator logs a failed initial refresh.
        let _ = client.refresh().await;
        Ok(client)
    }

    /// A client with no contract or account bound.
    ///
    /// Every action and every refresh fails with [`ClientError::NotConnected`]
    /// without touching the provider.
    pub fn disconnected(provider: Arc<P>, config: &ClientConfig) -> Result<Self, ClientError> {
        Self::build(provider, Session::disconnected(), config)
    }

    fn build(provider: Arc<P>, session: Session, config: &ClientConfig) -> Result<Self, ClientError> {
        let abi = Arc::new(ElectionAbi::embedded()?);
        let session = Arc::new(RwLock::new(session));
        let metrics = Arc::new(ClientMetrics::new());
        let coordinator = SyncCoordinator::new(
            Arc::clone(&provider),
            Arc::clone(&abi),
            Arc::clone(&session),
            config.scan_concurrency,
            Arc::clone(&metrics),
        );
        let orchestrator = TransactionOrchestrator::new(
            provider,
            abi,
            Arc::clone(&session),
            coordinator.clone(),
            config.receipt_poll_interval(),
            Arc::clone(&metrics),
        );
        Ok(Self {
            session,
            coordinator,
            orchestrator,
            metrics,
        })
    }

    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.coordinator.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.coordinator.subscribe()
    }

    /// Re-read user status and candidates. On failure the current snapshot is kept.
    pub async fn refresh(&self) -> Result<Arc<StateSnapshot>, ClientError> {
        self.coordinator.refresh().await
    }

    pub async fn session(&self) -> Session {
        *self.session.read().await
    }

    /// Drop the contract and account bindings.
    pub async fn disconnect(&self) {
        self.session.write().await.disconnect();
        info!("session disconnected");
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    pub async fn submit(&self, action: Action) -> Result<TransactionHandle, ClientError> {
        self.orchestrator.submit(action).await
    }

    pub async fn vote(&self, candidate: &str) -> Result<TransactionHandle, ClientError> {
        self.submit(Action::Vote {
            candidate: candidate.to_string(),
        })
        .await
    }

    pub async fn approve(&self, voter: Address) -> Result<TransactionHandle, ClientError> {
        self.submit(Action::Approve { voter }).await
    }

    pub async fn batch_approve(
        &self,
        voters: Vec<Address>,
    ) -> Result<TransactionHandle, ClientError> {
        self.submit(Action::BatchApprove { voters }).await
    }

    /// Add a candidate. Once confirmed, one full refresh runs before the handle settles.
    pub async fn add_candidate(&self, name: &str) -> Result<TransactionHandle, ClientError> {
        self.submit(Action::AddCandidate {
            name: name.to_string(),
        })
        .await
    }

    /// Register the session account as a voter.
    pub async fn request_approval(&self) -> Result<TransactionHandle, ClientError> {
        self.submit(Action::RequestApproval).await
    }
}
