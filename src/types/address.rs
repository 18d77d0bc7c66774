//! Account and contract addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::hash_data;

/// Domain separator for development account derivation
const DEV_ACCOUNT_DOMAIN: &[u8] = b"harvest-ap/dev-account";

/// Domain separator for contract address derivation
const CREATE_DOMAIN: &[u8] = b"harvest-ap/create";

/// A 20-byte address, rendered like an Ethereum address.
///
/// Externally owned accounts are plain identifiers; contract addresses are
/// derived from the deployer and its nonce (see [`Address::create`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address (mint source, burn sink)
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an address from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic development account `index`
    ///
    /// Index 0 is the default administrator.
    #[must_use]
    pub fn dev_account(index: u32) -> Self {
        let mut data = DEV_ACCOUNT_DOMAIN.to_vec();
        data.extend_from_slice(&index.to_le_bytes());
        Self::truncate(&hash_data(&data).as_bytes()[..20])
    }

    /// Address of the contract `deployer` creates with `nonce`
    #[must_use]
    pub fn create(deployer: &Self, nonce: u64) -> Self {
        let mut data = CREATE_DOMAIN.to_vec();
        data.extend_from_slice(&deployer.0);
        data.extend_from_slice(&nonce.to_le_bytes());
        Self::truncate(&hash_data(&data).as_bytes()[..20])
    }

    fn truncate(bytes: &[u8]) -> Self {
        let mut addr = [0u8; 20];
        addr.copy_from_slice(bytes);
        Self(addr)
    }

    /// Get the underlying bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to hex string with 0x prefix
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex string (with or without 0x prefix)
    ///
    /// # Errors
    /// Returns error if hex is invalid or wrong length
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| AddressError::InvalidHex)?;

        if bytes.len() != 20 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        Ok(Self::truncate(&bytes))
    }

    /// Check if this is the zero address
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Address parsing errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AddressError {
    /// Invalid hex encoding
    #[error("invalid hex encoding")]
    InvalidHex,
    /// Invalid address length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_accounts_distinct() {
        let a = Address::dev_account(0);
        let b = Address::dev_account(1);
        assert_ne!(a, b);
        assert_eq!(a, Address::dev_account(0));
        assert!(!a.is_zero());
    }

    #[test]
    fn test_create_depends_on_nonce() {
        let deployer = Address::dev_account(0);
        assert_ne!(Address::create(&deployer, 0), Address::create(&deployer, 1));
        assert_eq!(Address::create(&deployer, 7), Address::create(&deployer, 7));
    }

    #[test]
    fn test_parse_junk_address() {
        let junk = format!("0x{}", "22".repeat(20));
        let addr: Address = junk.parse().unwrap();
        assert_eq!(addr.to_hex(), junk);
        assert!(matches!(
            Address::from_hex("0x1234"),
            Err(AddressError::InvalidLength(2))
        ));
        assert!(matches!(
            Address::from_hex("zz"),
            Err(AddressError::InvalidHex)
        ));
    }
}
