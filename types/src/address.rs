//! 20-byte account address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// An account or contract address.
///
/// Parsing accepts hex with or without the `0x` prefix in any letter case.
/// Rendering is always lowercase and `0x`-prefixed, so two addresses that
/// differ only in case compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != Self::LEN * 2 {
            return Err(TypesError::InvalidAddress(format!(
                "expected {} hex digits, got {}: {s}",
                Self::LEN * 2,
                digits.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| TypesError::InvalidAddress(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_hex()
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "0x8700269FFb81ACE4784ab27eCF9a633326c478E3";

    #[test]
    fn parse_is_case_insensitive() {
        let upper: Address = MIXED.to_uppercase().replace("0X", "0x").parse().unwrap();
        let lower: Address = MIXED.to_lowercase().parse().unwrap();
        let mixed: Address = MIXED.parse().unwrap();
        assert_eq!(upper, lower);
        assert_eq!(mixed, lower);
    }

    #[test]
    fn display_is_lowercase_with_prefix() {
        let addr: Address = MIXED.parse().unwrap();
        assert_eq!(addr.to_string(), MIXED.to_lowercase());
    }

    #[test]
    fn prefix_is_optional() {
        let with: Address = MIXED.parse().unwrap();
        let without: Address = MIXED.trim_start_matches("0x").parse().unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(matches!(
            "0xabc".parse::<Address>(),
            Err(TypesError::InvalidAddress(_))
        ));
    }

    #[test]
    fn non_hex_is_rejected() {
        let bad = format!("0x{}", "zz".repeat(20));
        assert!(bad.parse::<Address>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_string() {
        let addr: Address = MIXED.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", MIXED.to_lowercase()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
