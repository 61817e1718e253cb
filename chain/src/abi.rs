//! The election contract ABI.
//!
//! The JSON interface ships inside the crate and is parsed once with `ethabi`.
//! Calls are addressed by method name; encoding an unknown method or
//! arguments of the wrong shape fails before anything reaches the provider.

use ethabi::{Contract, Function, Token};

use crate::error::ChainError;

/// Contract method names, exactly as they appear in the ABI.
pub mod methods {
    pub const VOTER_IS_REGISTERED: &str = "voterIsRegistered";
    pub const REGISTRATION_IS_APPROVED: &str = "registrationIsApproved";
    pub const VOTER_HAS_VOTED: &str = "voterHasVoted";
    pub const OWNER: &str = "owner";
    pub const GET_CANDIDATE_COUNT: &str = "getCandidateCount";
    pub const GET_CANDIDATE_NAME_FOR_INDEX: &str = "getCandidateNameForIndex";
    pub const GET_VOTE_COUNT_FOR_CANDIDATE: &str = "getVoteCountForCandidate";
    pub const VOTE_FOR_CANDIDATE: &str = "voteForCandidate";
    pub const APPROVE_REGISTRATION: &str = "approveRegistration";
    pub const APPROVE_REGISTRATIONS: &str = "approveRegistrations";
    pub const ADD_CANDIDATE: &str = "addCandidate";
    pub const REGISTER_VOTER: &str = "registerVoter";
}

const ELECTION_ABI_JSON: &str = include_str!("../abi/election.json");

/// Parsed election contract interface.
#[derive(Debug, Clone)]
pub struct ElectionAbi {
    contract: Contract,
}

impl ElectionAbi {
    /// The interface bundled with this crate.
    pub fn embedded() -> Result<Self, ChainError> {
        Self::from_json(ELECTION_ABI_JSON)
    }

    /// Parse an ABI from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ChainError> {
        let contract = Contract::load(json.as_bytes())?;
        Ok(Self { contract })
    }

    pub fn function(&self, method: &str) -> Result<&Function, ChainError> {
        self.contract
            .function(method)
            .map_err(|_| ChainError::Abi(format!("method {method} is not part of the contract")))
    }

    /// Selector plus encoded arguments for `method`.
    pub fn encode_call(&self, method: &str, args: &[Token]) -> Result<Vec<u8>, ChainError> {
        let function = self.function(method)?;
        function
            .encode_input(args)
            .map_err(|e| ChainError::Abi(format!("{method}: {e}")))
    }

    /// Decode the raw return data of `method`.
    pub fn decode_output(&self, method: &str, data: &[u8]) -> Result<Vec<Token>, ChainError> {
        let function = self.function(method)?;
        function.decode_output(data).map_err(|e| ChainError::Decode {
            method: method.to_string(),
            detail: e.to_string(),
        })
    }

    /// Identify the method a piece of call data targets and decode its arguments.
    pub fn decode_call(&self, data: &[u8]) -> Result<(&Function, Vec<Token>), ChainError> {
        if data.len() < 4 {
            return Err(ChainError::Abi(format!(
                "call data is {} bytes, shorter than a selector",
                data.len()
            )));
        }
        let (selector, args) = data.split_at(4);
        let function = self
            .contract
            .functions()
            .find(|f| &f.short_signature()[..] == selector)
            .ok_or_else(|| ChainError::Abi(format!("unknown selector 0x{}", hex::encode(selector))))?;
        let tokens = function
            .decode_input(args)
            .map_err(|e| ChainError::Abi(format!("{}: {e}", function.name)))?;
        Ok((function, tokens))
    }

    /// Encode return values for `method`, checking them against its outputs.
    pub fn encode_output(&self, method: &str, values: &[Token]) -> Result<Vec<u8>, ChainError> {
        let function = self.function(method)?;
        let types: Vec<_> = function.outputs.iter().map(|p| p.kind.clone()).collect();
        if !Token::types_check(values, &types) {
            return Err(ChainError::Abi(format!(
                "{method}: return values {values:?} do not match {types:?}"
            )));
        }
        Ok(ethabi::encode(values))
    }
}
