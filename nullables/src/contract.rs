//! Nullable election contract: in-memory state with the contract's rules.

use std::collections::HashSet;

use election_types::{Address, CandidateName};

/// In-memory copy of the election contract's storage.
///
/// Mutating methods return `Err(reason)` where the real contract would revert.
#[derive(Clone, Debug, Default)]
pub struct NullElection {
    pub owner: Address,
    /// `(raw name, votes)` in index order.
    pub candidates: Vec<(CandidateName, u64)>,
    pub registered: HashSet<Address>,
    pub approved: HashSet<Address>,
    pub voted: HashSet<Address>,
}

impl NullElection {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    pub fn is_registered(&self, voter: &Address) -> bool {
        self.registered.contains(voter)
    }

    pub fn is_approved(&self, voter: &Address) -> bool {
        self.approved.contains(voter)
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voted.contains(voter)
    }

    pub fn candidate_at(&self, index: usize) -> Option<CandidateName> {
        self.candidates.get(index).map(|(name, _)| *name)
    }

    /// Votes keyed by raw name; unknown names read as zero like a Solidity mapping.
    pub fn votes_for(&self, name: &CandidateName) -> u64 {
        self.candidates
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, votes)| *votes)
    }

    pub fn register_voter(&mut self, sender: Address) -> Result<(), String> {
        if !self.registered.insert(sender) {
            return Err("voter already registered".into());
        }
        Ok(())
    }

    pub fn approve_registration(&mut self, sender: Address, voter: Address) -> Result<(), String> {
        self.only_owner(sender)?;
        if !self.registered.contains(&voter) {
            return Err(format!("{voter} is not registered"));
        }
        self.approved.insert(voter);
        Ok(())
    }

    /// All-or-nothing, like a reverting loop on-chain.
    pub fn approve_registrations(
        &mut self,
        sender: Address,
        voters: &[Address],
    ) -> Result<(), String> {
        self.only_owner(sender)?;
        if let Some(missing) = voters.iter().find(|v| !self.registered.contains(*v)) {
            return Err(format!("{missing} is not registered"));
        }
        self.approved.extend(voters.iter().copied());
        Ok(())
    }

    pub fn add_candidate(&mut self, sender: Address, name: CandidateName) -> Result<(), String> {
        self.only_owner(sender)?;
        if self.candidates.iter().any(|(n, _)| *n == name) {
            return Err("candidate already exists".into());
        }
        self.candidates.push((name, 0));
        Ok(())
    }

    pub fn vote_for_candidate(
        &mut self,
        sender: Address,
        name: CandidateName,
    ) -> Result<(), String> {
        if !self.approved.contains(&sender) {
            return Err("voter is not approved".into());
        }
        if self.voted.contains(&sender) {
            return Err("voter has already voted".into());
        }
        let entry = self
            .candidates
            .iter_mut()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| "unknown candidate".to_string())?;
        entry.1 += 1;
        self.voted.insert(sender);
        Ok(())
    }

    fn only_owner(&self, sender: Address) -> Result<(), String> {
        if sender != self.owner {
            return Err("caller is not the owner".into());
        }
        Ok(())
    }
}
