//! Chain state: storage, sender nonces, deployed contracts and receipts.
//!
//! `ChainState::apply` is the single mutation entry point. Each transaction
//! either commits completely (storage written, nonce bumped, block sealed,
//! receipt recorded) or leaves all of that untouched.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contracts::loader::ContractSpec;
use crate::contracts::processor::{TransactionProcessor, DEFAULT_MAX_CALL_DEPTH};
use crate::contracts::state::{compute_storage_root, Storage};
use crate::contracts::transaction::{ContractTransaction, TransactionKind};
use crate::contracts::{decode, encode, ContractEvent, ContractResult, ExecutionResult};
use crate::crypto::Hash;
use crate::types::{now_millis, Address, Timestamp};

/// Record of a committed transaction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt {
    /// Block the transaction was sealed in
    pub block_number: u64,
    /// Transaction ID
    pub tx_id: Hash,
    /// Sender
    pub sender: Address,
    /// Target contract (or the deployed address)
    pub target: Address,
    /// Events emitted
    pub events: Vec<ContractEvent>,
    /// State root after the transaction
    pub state_root: Hash,
    /// When the block was sealed
    pub timestamp: Timestamp,
}

/// Full chain state; one transaction per block
pub struct ChainState {
    storage: Storage,
    nonces: HashMap<Address, u64>,
    processor: TransactionProcessor,
    block_number: u64,
    receipts: Vec<Receipt>,
}

impl ChainState {
    /// Empty chain with the given nested call limit
    #[must_use]
    pub fn new(max_call_depth: usize) -> Self {
        Self {
            storage: Storage::new(),
            nonces: HashMap::new(),
            processor: TransactionProcessor::new(max_call_depth),
            block_number: 0,
            receipts: Vec::new(),
        }
    }

    /// Last committed nonce of `account` (0 if it never sent anything)
    #[must_use]
    pub fn nonce(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    /// Nonce the next transaction from `account` must carry
    #[must_use]
    pub fn next_nonce(&self, account: &Address) -> u64 {
        self.nonce(account) + 1
    }

    /// Number of sealed blocks
    #[must_use]
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Receipts of all committed transactions, oldest first
    #[must_use]
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Current state root
    #[must_use]
    pub fn state_root(&self) -> Hash {
        compute_storage_root(&self.storage)
    }

    /// Name and version of the contract at `address`
    #[must_use]
    pub fn contract_info(&self, address: &Address) -> Option<(String, u32)> {
        self.processor
            .registry()
            .get(address)
            .map(|c| (c.name().to_string(), c.version()))
    }

    /// Apply a transaction atomically
    pub fn apply(&mut self, kind: &TransactionKind) -> ContractResult<ExecutionResult> {
        let result = self
            .processor
            .process_transaction(kind, &mut self.storage, &self.nonces)?;

        let sender = kind.sender();
        self.nonces.insert(sender, kind.nonce());
        self.block_number += 1;
        self.receipts.push(Receipt {
            block_number: self.block_number,
            tx_id: kind.id(),
            sender,
            target: kind.target(),
            events: result.events.clone(),
            state_root: result.new_state_root,
            timestamp: now_millis(),
        });

        debug!(
            block = self.block_number,
            sender = %sender,
            nonce = kind.nonce(),
            "Sealed block"
        );

        Ok(result)
    }

    /// Deploy `spec` from `deployer` with its next nonce
    pub fn deploy(&mut self, deployer: Address, spec: ContractSpec) -> ContractResult<Address> {
        let kind = TransactionKind::Deploy {
            spec,
            deployer,
            nonce: self.next_nonce(&deployer),
        };
        self.apply(&kind)?.decode_output()
    }

    /// Send an encoded call from `sender` with its next nonce
    pub fn send(
        &mut self,
        sender: Address,
        target: Address,
        input: Vec<u8>,
    ) -> ContractResult<ExecutionResult> {
        let tx = ContractTransaction::new(sender, target, input, self.next_nonce(&sender));
        self.apply(&TransactionKind::Execute(tx))
    }

    /// Send a typed call and decode its return value
    pub fn send_typed<I: Serialize, O: DeserializeOwned>(
        &mut self,
        sender: Address,
        target: Address,
        call: &I,
    ) -> ContractResult<(O, ExecutionResult)> {
        let result = self.send(sender, target, encode(call)?)?;
        let output = result.decode_output()?;
        Ok((output, result))
    }

    /// Execute a typed call without committing anything
    pub fn call_static<I: Serialize, O: DeserializeOwned>(
        &mut self,
        caller: Address,
        target: Address,
        call: &I,
    ) -> ContractResult<O> {
        let output =
            self.processor
                .call_static(caller, target, &encode(call)?, &mut self.storage)?;
        decode(&output)
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALL_DEPTH)
    }
}
