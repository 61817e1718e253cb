//! Election client.
//!
//! Keeps a local [`StateSnapshot`](election_types::StateSnapshot) in sync with
//! an on-chain election contract and sends state-changing transactions on
//! behalf of a single wallet account.
//!
//! - [`SyncCoordinator`] runs full refreshes: [`UserStatusResolver`] for the
//!   active account, then [`CandidateScanner`] for the candidate list.
//! - [`TransactionOrchestrator`] submits [`Action`]s and settles each
//!   [`TransactionHandle`] exactly once.
//! - [`ElectionClient`] ties both to a [`Session`] and a wallet provider.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod scanner;
pub mod session;

pub use client::ElectionClient;
pub use config::ClientConfig;
pub use coordinator::SyncCoordinator;
pub use error::ClientError;
pub use metrics::ClientMetrics;
pub use orchestrator::{Action, TransactionHandle, TransactionOrchestrator};
pub use resolver::UserStatusResolver;
pub use scanner::CandidateScanner;
pub use session::{Session, SharedSession};
