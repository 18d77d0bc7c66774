//! Contract transaction types.
//!
//! Transactions are requests to execute contract logic: a sender, a target
//! contract, encoded input and the sender's nonce.

use serde::{Deserialize, Serialize};

use super::loader::ContractSpec;
use crate::crypto::{hash_data, Hash};
use crate::types::{now_millis, Address, Timestamp};

/// A transaction that executes a contract call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractTransaction {
    /// Transaction ID (hash of contents)
    pub id: Hash,
    /// Account submitting the call
    pub sender: Address,
    /// Contract to execute
    pub target: Address,
    /// Encoded call for the target contract
    pub input: Vec<u8>,
    /// Nonce (for ordering transactions from same sender)
    pub nonce: u64,
    /// When transaction was created
    pub timestamp: Timestamp,
}

impl ContractTransaction {
    /// Create new contract transaction
    #[must_use]
    pub fn new(sender: Address, target: Address, input: Vec<u8>, nonce: u64) -> Self {
        let mut tx = Self {
            id: Hash::ZERO,
            sender,
            target,
            input,
            nonce,
            timestamp: now_millis(),
        };

        tx.id = tx.compute_id();
        tx
    }

    /// Compute transaction ID
    #[must_use]
    pub fn compute_id(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(self.sender.as_bytes());
        data.extend_from_slice(self.target.as_bytes());
        data.extend_from_slice(&self.input);
        data.extend_from_slice(&self.nonce.to_le_bytes());
        data.extend_from_slice(&self.timestamp.to_le_bytes());

        hash_data(&data)
    }
}

/// Types of contract transactions
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Execute a contract
    Execute(ContractTransaction),
    /// Deploy a new contract at `Address::create(deployer, nonce)`
    Deploy {
        /// What to deploy
        spec: ContractSpec,
        /// Deployer
        deployer: Address,
        /// Deployer's nonce for this transaction
        nonce: u64,
    },
}

impl TransactionKind {
    /// Account that submitted the transaction
    #[must_use]
    pub fn sender(&self) -> Address {
        match self {
            Self::Execute(tx) => tx.sender,
            Self::Deploy { deployer, .. } => *deployer,
        }
    }

    /// Sender nonce carried by the transaction
    #[must_use]
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Execute(tx) => tx.nonce,
            Self::Deploy { nonce, .. } => *nonce,
        }
    }

    /// Transaction ID
    #[must_use]
    pub fn id(&self) -> Hash {
        match self {
            Self::Execute(tx) => tx.id,
            Self::Deploy {
                spec,
                deployer,
                nonce,
            } => {
                let mut data = deployer.as_bytes().to_vec();
                data.extend_from_slice(&nonce.to_le_bytes());
                data.extend_from_slice(format!("{spec:?}").as_bytes());
                hash_data(&data)
            }
        }
    }

    /// Target contract, or the address a deployment will occupy
    #[must_use]
    pub fn target(&self) -> Address {
        match self {
            Self::Execute(tx) => tx.target,
            Self::Deploy {
                deployer, nonce, ..
            } => Address::create(deployer, *nonce),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_creation() {
        let sender = Address::dev_account(0);
        let target = Address::dev_account(1);

        let tx = ContractTransaction::new(sender, target, b"test input".to_vec(), 1);

        assert_eq!(tx.target, target);
        assert_eq!(tx.nonce, 1);
        assert_eq!(tx.id, tx.compute_id());
    }

    #[test]
    fn test_id_covers_nonce() {
        let sender = Address::dev_account(0);
        let target = Address::dev_account(1);

        let mut tx = ContractTransaction::new(sender, target, Vec::new(), 1);
        let first = tx.compute_id();
        tx.nonce = 2;
        assert_ne!(first, tx.compute_id());
    }

    #[test]
    fn test_deploy_target_is_create_address() {
        let deployer = Address::dev_account(0);
        let kind = TransactionKind::Deploy {
            spec: ContractSpec::Redemption {
                reward_token: Address::dev_account(1),
                ledger: Address::dev_account(2),
                version: 2,
            },
            deployer,
            nonce: 4,
        };

        assert_eq!(kind.sender(), deployer);
        assert_eq!(kind.nonce(), 4);
        assert_eq!(kind.target(), Address::create(&deployer, 4));
    }
}
