//! Candidates and the bytes32 encoding of their names.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// A candidate name in its on-chain fixed-width form.
///
/// The contract stores names as `bytes32`: the UTF-8 bytes of the name,
/// right-padded with zeros. The raw value doubles as the key for
/// `getVoteCountForCandidate`, so it is kept alongside the decoded text
/// rather than re-encoded from it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateName([u8; 32]);

impl CandidateName {
    pub const LEN: usize = 32;

    /// Wrap a raw bytes32 value read from the contract.
    pub fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Encode a UTF-8 name into its bytes32 form.
    ///
    /// Names that are empty, longer than 32 bytes, or that contain NUL are
    /// rejected: none of them survive a decode unchanged.
    pub fn encode(name: &str) -> Result<Self, TypesError> {
        if name.is_empty() {
            return Err(TypesError::EmptyName);
        }
        if name.len() > Self::LEN {
            return Err(TypesError::NameTooLong {
                len: name.len(),
                max: Self::LEN,
            });
        }
        if name.contains('\0') {
            return Err(TypesError::NameContainsNul);
        }
        let mut bytes = [0u8; 32];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(bytes))
    }

    /// Decode to UTF-8, dropping every zero byte.
    ///
    /// Zeros are skipped wherever they sit, not only in the padding, so a raw
    /// `a\0b` reads as `"ab"`.
    pub fn decode(&self) -> Result<String, TypesError> {
        let bytes: Vec<u8> = self.0.iter().copied().filter(|b| *b != 0).collect();
        String::from_utf8(bytes).map_err(|e| TypesError::InvalidUtf8(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex of all 32 bytes.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CandidateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(name) => write!(f, "CandidateName({name:?})"),
            Err(_) => write!(f, "CandidateName({})", self.to_hex()),
        }
    }
}

/// One entry of the candidate list, in on-chain index order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Name decoded from its bytes32 form.
    pub name: String,
    pub votes: u64,
}

impl Candidate {
    pub fn new(name: impl Into<String>, votes: u64) -> Self {
        Self {
            name: name.into(),
            votes,
        }
    }
}
