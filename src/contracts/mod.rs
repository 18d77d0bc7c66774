//! Contract execution framework.
//!
//! Contracts are stateless programs bound to an address. All of their
//! mutable data lives in chain storage and is reached through
//! [`ContractState`], which makes every transaction atomic.
//!
//! ## Architecture
//!
//! 1. **Contracts**: implement [`Contract`] and decode their own call enum
//! 2. **Transactions**: a sender, a target and bincode-encoded input
//! 3. **Processor**: validates, dispatches, routes nested calls, and
//!    commits or rolls back
//! 4. **Registry**: tracks deployed contracts by address
//!
//! The deployed system is three contracts: the participation ledger
//! (`HarvestAP`), its active redemption authority (`APRedemption`) and the
//! reward token (`FARM`).

pub mod balances;
pub mod ledger;
pub mod loader;
pub mod processor;
pub mod redemption;
pub mod reward_token;
pub mod state;
pub mod transaction;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::Hash;
use crate::types::{Address, Amount};

use self::processor::CallContext;

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

/// A contract that can be executed by the processor
pub trait Contract: Send + Sync {
    /// Address the contract is deployed at
    fn address(&self) -> Address;

    /// Human-readable contract name
    fn name(&self) -> &str;

    /// Contract version
    fn version(&self) -> u32;

    /// Execute one call against this contract
    ///
    /// `input` is the bincode encoding of the contract's call enum and the
    /// returned bytes are the bincode encoding of the call's return value.
    ///
    /// # Atomicity
    /// Errors propagate to the transaction boundary, where every write made
    /// by this call and any nested call is rolled back.
    fn execute(&self, ctx: &mut CallContext<'_, '_>, input: &[u8]) -> ContractResult<Vec<u8>>;

    /// Hook called once when the contract is deployed
    fn on_deploy(&self, _ctx: &mut CallContext<'_, '_>) -> ContractResult<()> {
        Ok(())
    }
}

/// Result of a committed transaction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// State root after the transaction
    pub new_state_root: Hash,
    /// Events emitted during execution, in order
    pub events: Vec<ContractEvent>,
    /// Encoded return value of the top-level call
    pub output: Vec<u8>,
}

impl ExecutionResult {
    /// Decode the top-level return value
    pub fn decode_output<T: DeserializeOwned>(&self) -> ContractResult<T> {
        decode(&self.output)
    }

    /// Events with the given topic
    pub fn events_with_topic<'a>(
        &'a self,
        topic: &'a str,
    ) -> impl Iterator<Item = &'a ContractEvent> + 'a {
        self.events.iter().filter(move |e| e.topic == topic)
    }
}

/// Events emitted by contracts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Contract that emitted the event
    pub contract: Address,
    /// Event topic (for indexing/filtering)
    pub topic: String,
    /// Encoded event payload
    pub data: Vec<u8>,
}

impl ContractEvent {
    /// Decode the event payload
    pub fn decode<T: DeserializeOwned>(&self) -> ContractResult<T> {
        decode(&self.data)
    }
}

/// Contract execution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Caller lacks the privilege the operation requires
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Debit larger than the available balance
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance {
        /// Amount needed
        need: Amount,
        /// Amount available
        have: Amount,
    },

    /// Transaction validation failed
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// No contract at the target address
    #[error("contract not found: {0}")]
    NotFound(Address),

    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,

    /// Nested calls went deeper than the processor allows
    #[error("call depth exceeded: limit {0}")]
    CallDepthExceeded(usize),

    /// Input, output or storage bytes could not be (de)serialized
    #[error("codec error: {0}")]
    Codec(String),
}

impl ContractError {
    /// Stable numeric code for each error kind
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Unauthorized(_) => 1,
            Self::InsufficientBalance { .. } => 2,
            Self::InvalidTransaction(_) => 3,
            Self::NotFound(_) => 4,
            Self::Overflow => 5,
            Self::CallDepthExceeded(_) => 6,
            Self::Codec(_) => 7,
        }
    }

    /// Whether this is an authorization failure
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether this is a balance failure
    #[must_use]
    pub const fn is_insufficient_balance(&self) -> bool {
        matches!(self, Self::InsufficientBalance { .. })
    }
}

/// Encode a call, return value, event or storage value
pub fn encode<T: Serialize>(value: &T) -> ContractResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ContractError::Codec(e.to_string()))
}

/// Decode a call, return value, event or storage value
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ContractResult<T> {
    bincode::deserialize(bytes).map_err(|e| ContractError::Codec(e.to_string()))
}

/// Registry of deployed contracts
///
/// Note: Cannot derive Clone or Debug because it contains trait objects
#[derive(Default)]
pub struct ContractRegistry {
    /// Contracts by address
    contracts: HashMap<Address, Box<dyn Contract>>,
}

impl ContractRegistry {
    /// Create new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            contracts: HashMap::new(),
        }
    }

    /// Register a contract
    pub fn register(&mut self, contract: Box<dyn Contract>) {
        let address = contract.address();
        self.contracts.insert(address, contract);
    }

    /// Get contract by address
    #[must_use]
    pub fn get(&self, address: &Address) -> Option<&dyn Contract> {
        self.contracts.get(address).map(std::convert::AsRef::as_ref)
    }

    /// Check if a contract exists at `address`
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Get number of registered contracts
    #[must_use]
    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let registry = ContractRegistry::new();
        assert_eq!(registry.contract_count(), 0);
        assert!(!registry.contains(&Address::ZERO));
    }

    #[test]
    fn test_error_codes_stable() {
        assert_eq!(ContractError::Unauthorized(String::new()).code(), 1);
        assert_eq!(
            ContractError::InsufficientBalance {
                need: Amount::from_raw(2),
                have: Amount::ZERO
            }
            .code(),
            2
        );
        assert_eq!(ContractError::Overflow.code(), 5);
    }

    #[test]
    fn test_codec_rejects_garbage() {
        let err = decode::<Address>(&[1, 2]).unwrap_err();
        assert!(matches!(err, ContractError::Codec(_)));
    }
}
