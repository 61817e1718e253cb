//! The aggregate state published after each successful refresh.

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::user::UserStatus;

/// Immutable view of user status plus candidate list.
///
/// A snapshot is never edited in place. Each successful refresh builds a new
/// one with `generation` incremented and swaps it in as a whole. The default
/// value (generation 0, no user, no candidates) means "not loaded yet" and
/// must not be read as an empty election.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub user: Option<UserStatus>,
    pub candidates: Vec<Candidate>,
    /// Count of successful refreshes that produced this snapshot.
    pub generation: u64,
}

impl StateSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    /// Build the successor of `previous` from freshly read state.
    pub fn next(previous: &StateSnapshot, user: UserStatus, candidates: Vec<Candidate>) -> Self {
        Self {
            user: Some(user),
            candidates,
            generation: previous.generation + 1,
        }
    }

    pub fn candidate(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.name == name)
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.votes).sum()
    }
}
