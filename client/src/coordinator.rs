//! Full refresh and snapshot publication.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use election_chain::{ChainError, ChainReader, ElectionAbi, WalletProvider};
use election_types::{Candidate, StateSnapshot, UserStatus};

use crate::metrics::ClientMetrics;
use crate::resolver::UserStatusResolver;
use crate::scanner::CandidateScanner;
use crate::session::SharedSession;
use crate::ClientError;

/// Drives full refreshes and owns the published [`StateSnapshot`].
///
/// A refresh reads the active account from the provider, resolves that
/// user's status, then scans the candidates. Only when both succeed is a new
/// snapshot swapped in; on any failure the previous snapshot stays current.
/// Refreshes run one at a time, so a later refresh always publishes data read
/// no earlier than the snapshot it replaces. Clones share the same session,
/// snapshot and refresh queue.
pub struct SyncCoordinator<P> {
    provider: Arc<P>,
    abi: Arc<ElectionAbi>,
    session: SharedSession,
    scan_concurrency: usize,
    snapshot: Arc<watch::Sender<Arc<StateSnapshot>>>,
    refresh_lock: Arc<Mutex<()>>,
    metrics: Arc<ClientMetrics>,
}

impl<P> Clone for SyncCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            abi: Arc::clone(&self.abi),
            session: Arc::clone(&self.session),
            scan_concurrency: self.scan_concurrency,
            snapshot: Arc::clone(&self.snapshot),
            refresh_lock: Arc::clone(&self.refresh_lock),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<P: WalletProvider> SyncCoordinator<P> {
    pub fn new(
        provider: Arc<P>,
        abi: Arc<ElectionAbi>,
        session: SharedSession,
        scan_concurrency: usize,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(StateSnapshot::default()));
        Self {
            provider,
            abi,
            session,
            scan_concurrency,
            snapshot: Arc::new(snapshot),
            refresh_lock: Arc::new(Mutex::new(())),
            metrics,
        }
    }

    /// The current snapshot. Generation 0 means nothing has loaded yet.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// A receiver notified every time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Re-read everything and publish the result.
    ///
    /// Waits for any refresh already in flight before reading.
    pub async fn refresh(&self) -> Result<Arc<StateSnapshot>, ClientError> {
        // Held from the first read until publication.
        let _queued = self.refresh_lock.lock().await;
        let started = Instant::now();
        let result = self.load().await;
        self.metrics
            .refresh_duration_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok((user, candidates)) => {
                let snapshot = self.publish(user, candidates);
                self.metrics.refreshes_succeeded.inc();
                self.metrics
                    .candidate_count
                    .set(snapshot.candidates.len() as i64);
                self.metrics
                    .snapshot_generation
                    .set(snapshot.generation as i64);
                info!(
                    generation = snapshot.generation,
                    candidates = snapshot.candidates.len(),
                    "snapshot published"
                );
                Ok(snapshot)
            }
            Err(error) => {
                self.metrics.refreshes_failed.inc();
                warn!(%error, "refresh failed, keeping previous snapshot");
                Err(error)
            }
        }
    }

    async fn load(&self) -> Result<(UserStatus, Vec<Candidate>), ClientError> {
        let contract = self.session.read().await.require_contract()?;

        let account = match self.provider.coinbase().await {
            Ok(account) => account,
            Err(ChainError::NoAccount) => {
                self.session.write().await.clear_account();
                return Err(ClientError::NotConnected);
            }
            Err(e) => return Err(e.into()),
        };
        if self.session.write().await.bind_account(account) {
            info!(%account, "active account bound");
        }

        let reader = ChainReader::new(Arc::clone(&self.provider), contract, Arc::clone(&self.abi));
        let user = UserStatusResolver::new(reader.clone())
            .resolve(account)
            .await?;
        let candidates = CandidateScanner::with_concurrency(reader, self.scan_concurrency)
            .scan()
            .await?;
        Ok((user, candidates))
    }

    fn publish(&self, user: UserStatus, candidates: Vec<Candidate>) -> Arc<StateSnapshot> {
        let mut published = Arc::default();
        self.snapshot.send_modify(|current| {
            *current = Arc::new(StateSnapshot::next(current, user, candidates));
            published = Arc::clone(current);
        });
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use election_chain::methods;
    use election_nullables::NullProvider;
    use election_types::{Address, RegistrationState};
    use tokio::sync::RwLock;

    use crate::session::Session;

    const OWNER: Address = Address::new([0x0a; 20]);
    const VOTER: Address = Address::new([0x7e; 20]);

    fn coordinator(provider: &Arc<NullProvider>, session: Session) -> SyncCoordinator<NullProvider> {
        SyncCoordinator::new(
            Arc::clone(provider),
            Arc::new(ElectionAbi::embedded().unwrap()),
            Arc::new(RwLock::new(session)),
            1,
            Arc::new(ClientMetrics::new()),
        )
    }

    #[tokio::test]
    async fn initial_snapshot_is_not_loaded() {
        let provider = Arc::new(NullProvider::new(OWNER));
        let coordinator = coordinator(&provider, Session::connected(NullProvider::CONTRACT, None));
        assert!(!coordinator.snapshot().is_loaded());
    }

    #[tokio::test]
    async fn refresh_publishes_and_notifies() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.set_coinbase(Some(VOTER));
        provider.seed_candidate("alice", 2);
        let coordinator = coordinator(&provider, Session::connected(NullProvider::CONTRACT, None));
        let mut updates = coordinator.subscribe();

        let snapshot = coordinator.refresh().await.unwrap();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.candidates, vec![Candidate::new("alice", 2)]);
        assert_eq!(
            snapshot.user.as_ref().map(|u| u.registration),
            Some(RegistrationState::PendingRegistration)
        );

        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().generation, 1);
        assert_eq!(coordinator.snapshot(), snapshot);
    }

    #[tokio::test]
    async fn refresh_rebinds_the_active_account() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.set_coinbase(Some(VOTER));
        let session = Session::connected(NullProvider::CONTRACT, Some(OWNER));
        let coordinator = coordinator(&provider, session);

        coordinator.refresh().await.unwrap();
        assert_eq!(coordinator.session.read().await.account(), Some(VOTER));
        assert_eq!(coordinator.snapshot().user.as_ref().map(|u| u.address), Some(VOTER));
    }

    #[tokio::test]
    async fn lost_account_is_not_connected() {
        let provider = Arc::new(NullProvider::new(OWNER));
        let session = Session::connected(NullProvider::CONTRACT, Some(VOTER));
        let coordinator = coordinator(&provider, session);

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert_eq!(coordinator.session.read().await.account(), None);
        assert!(provider.reads().is_empty());
    }

    #[tokio::test]
    async fn failed_scan_keeps_previous_snapshot() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.set_coinbase(Some(VOTER));
        provider.seed_candidate("alice", 2);
        let coordinator = coordinator(&provider, Session::connected(NullProvider::CONTRACT, None));
        let first = coordinator.refresh().await.unwrap();

        provider.fail_reads_of(
            methods::GET_VOTE_COUNT_FOR_CANDIDATE,
            ChainError::Transport("timed out".into()),
        );
        assert!(coordinator.refresh().await.is_err());
        assert_eq!(coordinator.snapshot(), first);
        assert_eq!(coordinator.metrics.refreshes_failed.get(), 1);
    }

    #[tokio::test]
    async fn disconnected_refresh_makes_no_calls() {
        let provider = Arc::new(NullProvider::new(OWNER));
        provider.set_coinbase(Some(VOTER));
        let coordinator = coordinator(&provider, Session::disconnected());

        assert!(matches!(
            coordinator.refresh().await,
            Err(ClientError::NotConnected)
        ));
        assert_eq!(provider.network_calls(), 0);
    }
}
