//! Nullable infrastructure for deterministic testing.
//!
//! The chain is the only external dependency of the election client, and it is
//! reached through the [`WalletProvider`](election_chain::WalletProvider) trait.
//! This crate provides a test-friendly implementation that:
//! - Simulates the election contract in memory, including its revert rules
//! - Records every read and transaction so tests can assert on traffic
//! - Can be told to fail specific methods or reject transactions
//! - Never touches the network
//!
//! Usage: hand an `Arc<NullProvider>` to the client in place of a JSON-RPC provider.

pub mod contract;
pub mod provider;

pub use contract::NullElection;
pub use provider::NullProvider;
