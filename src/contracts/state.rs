//! Contract state interface - provides controlled access to chain storage.
//!
//! Contracts interact with the chain through `ContractState`, which:
//! - Provides read/write access to per-contract key-value storage
//! - Records every write so a failed transaction can be undone
//! - Collects events emitted during execution
//! - Computes the state root over all storage

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{decode, encode, ContractEvent, ContractResult};
use crate::crypto::{hash_data, merkle_root, Hash};
use crate::types::Address;

/// Chain storage: `(contract, key) -> value`
pub type Storage = HashMap<(Address, Vec<u8>), Vec<u8>>;

/// State interface for contract execution
///
/// Writes are applied to the wrapped storage immediately and logged; the
/// log is discarded on commit and replayed backwards on rollback.
#[derive(Debug)]
pub struct ContractState<'a> {
    /// Contract-specific key-value storage
    storage: &'a mut Storage,
    /// Pending state mutations (for atomic commit/rollback)
    mutations: Vec<StateMutation>,
    /// Events emitted during execution
    events: Vec<ContractEvent>,
}

/// A storage write that can be rolled back
#[derive(Clone, Debug)]
struct StateMutation {
    /// Contract address
    contract: Address,
    /// Storage key
    key: Vec<u8>,
    /// Old value (None if the slot was empty)
    old_value: Option<Vec<u8>>,
}

impl<'a> ContractState<'a> {
    /// Create new contract state wrapper
    #[must_use]
    pub fn new(storage: &'a mut Storage) -> Self {
        Self {
            storage,
            mutations: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Read from contract storage
    #[must_use]
    pub fn storage_read(&self, contract: &Address, key: &[u8]) -> Option<Vec<u8>> {
        self.storage.get(&(*contract, key.to_vec())).cloned()
    }

    /// Write to contract storage
    pub fn storage_write(&mut self, contract: Address, key: Vec<u8>, value: Vec<u8>) {
        let old_value = self.storage.insert((contract, key.clone()), value);
        self.mutations.push(StateMutation {
            contract,
            key,
            old_value,
        });
    }

    /// Delete from contract storage
    pub fn storage_delete(&mut self, contract: Address, key: Vec<u8>) {
        let old_value = self.storage.remove(&(contract, key.clone()));
        if old_value.is_some() {
            self.mutations.push(StateMutation {
                contract,
                key,
                old_value,
            });
        }
    }

    /// Read and decode a typed value
    pub fn read_value<T: DeserializeOwned>(
        &self,
        contract: &Address,
        key: &[u8],
    ) -> ContractResult<Option<T>> {
        self.storage
            .get(&(*contract, key.to_vec()))
            .map(|bytes| decode(bytes))
            .transpose()
    }

    /// Encode and write a typed value
    pub fn write_value<T: Serialize>(
        &mut self,
        contract: Address,
        key: Vec<u8>,
        value: &T,
    ) -> ContractResult<()> {
        let bytes = encode(value)?;
        self.storage_write(contract, key, bytes);
        Ok(())
    }

    /// Emit an event
    pub fn emit_event(&mut self, event: ContractEvent) {
        self.events.push(event);
    }

    /// Get all emitted events
    #[must_use]
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Number of writes not yet committed
    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.mutations.len()
    }

    /// Commit all pending mutations
    ///
    /// Writes are already in storage; this drops the undo log and hands back
    /// the collected events.
    pub fn commit(&mut self) -> Vec<ContractEvent> {
        self.mutations.clear();
        std::mem::take(&mut self.events)
    }

    /// Rollback all pending mutations
    ///
    /// Restores every written slot to its value before execution started and
    /// drops the collected events.
    pub fn rollback(&mut self) {
        for mutation in self.mutations.drain(..).rev() {
            let slot = (mutation.contract, mutation.key);
            match mutation.old_value {
                Some(old) => {
                    self.storage.insert(slot, old);
                }
                None => {
                    self.storage.remove(&slot);
                }
            }
        }

        self.events.clear();
    }

    /// Compute state root hash over the wrapped storage
    #[must_use]
    pub fn compute_state_root(&self) -> Hash {
        compute_storage_root(self.storage)
    }
}

/// Merkle root over every storage slot, sorted by `(contract, key)`
#[must_use]
pub fn compute_storage_root(storage: &Storage) -> Hash {
    let mut slots: Vec<(&(Address, Vec<u8>), &Vec<u8>)> = storage.iter().collect();
    slots.sort_by(|a, b| a.0.cmp(b.0));

    let leaves: Vec<Hash> = slots
        .into_iter()
        .map(|((contract, key), value)| {
            let mut data = Vec::with_capacity(20 + 8 + key.len() + value.len());
            data.extend_from_slice(contract.as_bytes());
            data.extend_from_slice(&(key.len() as u64).to_le_bytes());
            data.extend_from_slice(key);
            data.extend_from_slice(value);
            hash_data(&data)
        })
        .collect();

    merkle_root(&leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Address {
        Address::dev_account(42)
    }

    #[test]
    fn test_storage() {
        let mut storage = Storage::new();
        let mut state = ContractState::new(&mut storage);

        let key = b"counter".to_vec();
        let value = b"42".to_vec();

        // Write
        state.storage_write(contract(), key.clone(), value.clone());
        assert_eq!(state.storage_read(&contract(), &key), Some(value));

        // Rollback should revert
        state.rollback();
        assert_eq!(state.storage_read(&contract(), &key), None);
    }

    #[test]
    fn test_rollback_restores_overwritten_value() {
        let mut storage = Storage::new();
        storage.insert((contract(), b"k".to_vec()), b"old".to_vec());

        let mut state = ContractState::new(&mut storage);
        state.storage_write(contract(), b"k".to_vec(), b"new".to_vec());
        state.storage_write(contract(), b"k".to_vec(), b"newer".to_vec());
        state.storage_delete(contract(), b"k".to_vec());
        assert_eq!(state.storage_read(&contract(), b"k"), None);

        state.rollback();
        assert_eq!(state.storage_read(&contract(), b"k"), Some(b"old".to_vec()));
    }

    #[test]
    fn test_commit_keeps_writes_and_returns_events() {
        let mut storage = Storage::new();
        {
            let mut state = ContractState::new(&mut storage);
            state.write_value(contract(), b"n".to_vec(), &7u64).unwrap();
            state.emit_event(ContractEvent {
                contract: contract(),
                topic: "Set".to_string(),
                data: Vec::new(),
            });
            let events = state.commit();
            assert_eq!(events.len(), 1);
            assert_eq!(state.pending_mutations(), 0);
        }

        let state = ContractState::new(&mut storage);
        assert_eq!(state.read_value::<u64>(&contract(), b"n").unwrap(), Some(7));
    }

    #[test]
    fn test_state_root_tracks_rollback() {
        let mut storage = Storage::new();
        let before = compute_storage_root(&storage);

        let mut state = ContractState::new(&mut storage);
        state.storage_write(contract(), b"a".to_vec(), b"1".to_vec());
        assert_ne!(state.compute_state_root(), before);

        state.rollback();
        assert_eq!(state.compute_state_root(), before);
    }
}
