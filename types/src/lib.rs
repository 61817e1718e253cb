//! Fundamental types for the election client.
//!
//! This crate defines the values shared across every other crate in the workspace:
//! account addresses, the bytes32 candidate-name encoding, the derived user status,
//! and the immutable state snapshot published to consumers.

pub mod address;
pub mod candidate;
pub mod error;
pub mod snapshot;
pub mod user;

pub use address::Address;
pub use candidate::{Candidate, CandidateName};
pub use error::TypesError;
pub use snapshot::StateSnapshot;
pub use user::{RegistrationState, UserStatus};
