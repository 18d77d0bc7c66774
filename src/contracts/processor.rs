//! Transaction processor - executes contracts and applies state transitions.
//!
//! This is the enforcement mechanism that makes every operation atomic.
//! It validates a transaction, dispatches it to the target contract, routes
//! any nested contract-to-contract calls, and either commits every write or
//! rolls all of them back.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::loader::{ContractLoader, ContractSpec, NativeLoader};
use super::state::{ContractState, Storage};
use super::transaction::{ContractTransaction, TransactionKind};
use super::{
    decode, encode, ContractError, ContractEvent, ContractRegistry, ContractResult, ExecutionResult,
};
use crate::types::Address;

/// Default bound on nested call depth
pub const DEFAULT_MAX_CALL_DEPTH: usize = 16;

/// Execution context handed to a contract for one call.
///
/// `caller` is the account or contract that made this call; for a nested
/// call it is the calling contract's address, never the transaction sender.
pub struct CallContext<'p, 's> {
    processor: &'p TransactionProcessor,
    state: &'p mut ContractState<'s>,
    caller: Address,
    this: Address,
    depth: usize,
}

impl<'p, 's> CallContext<'p, 's> {
    fn root(
        processor: &'p TransactionProcessor,
        state: &'p mut ContractState<'s>,
        caller: Address,
        this: Address,
    ) -> Self {
        Self {
            processor,
            state,
            caller,
            this,
            depth: 0,
        }
    }

    /// Immediate caller of this call
    #[must_use]
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Address of the executing contract
    #[must_use]
    pub fn this(&self) -> Address {
        self.this
    }

    /// Current nesting depth (0 for the top-level call)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Read access to chain storage
    #[must_use]
    pub fn state(&self) -> &ContractState<'s> {
        &*self.state
    }

    /// Write access to chain storage
    pub fn state_mut(&mut self) -> &mut ContractState<'s> {
        &mut *self.state
    }

    /// Call another contract with `caller = self.this()`
    pub fn call(&mut self, target: Address, input: &[u8]) -> ContractResult<Vec<u8>> {
        let processor = self.processor;
        if self.depth + 1 > processor.max_call_depth {
            return Err(ContractError::CallDepthExceeded(processor.max_call_depth));
        }

        let contract = processor
            .registry
            .get(&target)
            .ok_or(ContractError::NotFound(target))?;

        debug!(
            caller = %self.this,
            target = %target,
            contract = contract.name(),
            depth = self.depth + 1,
            "Nested contract call"
        );

        let mut nested = CallContext {
            processor,
            state: &mut *self.state,
            caller: self.this,
            this: target,
            depth: self.depth + 1,
        };
        contract.execute(&mut nested, input)
    }

    /// Encode `call`, invoke `target` and decode its return value
    pub fn call_typed<I: Serialize, O: DeserializeOwned>(
        &mut self,
        target: Address,
        call: &I,
    ) -> ContractResult<O> {
        let input = encode(call)?;
        let output = self.call(target, &input)?;
        decode(&output)
    }

    /// Emit an event from the executing contract
    pub fn emit<T: Serialize>(&mut self, topic: &str, data: &T) -> ContractResult<()> {
        let event = ContractEvent {
            contract: self.this,
            topic: topic.to_string(),
            data: encode(data)?,
        };
        self.state.emit_event(event);
        Ok(())
    }
}

/// Processes contract transactions and applies state transitions
pub struct TransactionProcessor {
    /// Maximum nested call depth
    max_call_depth: usize,
    /// Contract registry for looking up contracts
    registry: ContractRegistry,
    /// Contract loader for deploying new contracts
    loader: Box<dyn ContractLoader>,
}

impl TransactionProcessor {
    /// Create new transaction processor with empty registry
    #[must_use]
    pub fn new(max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            registry: ContractRegistry::new(),
            loader: Box::new(NativeLoader::new()),
        }
    }

    /// Get reference to contract registry
    #[must_use]
    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Configured nested call limit
    #[must_use]
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Process a transaction of any kind
    ///
    /// `nonces` holds each sender's last committed nonce; the caller bumps it
    /// only after this returns `Ok`.
    pub fn process_transaction(
        &mut self,
        kind: &TransactionKind,
        storage: &mut Storage,
        nonces: &HashMap<Address, u64>,
    ) -> ContractResult<ExecutionResult> {
        validate_nonce(kind.sender(), kind.nonce(), nonces)?;
        // Contracts only act through nested calls
        if self.registry.contains(&kind.sender()) {
            return Err(ContractError::InvalidTransaction(format!(
                "contract {} cannot originate transactions",
                kind.sender()
            )));
        }

        match kind {
            TransactionKind::Deploy {
                spec,
                deployer,
                nonce,
            } => {
                let address = Address::create(deployer, *nonce);
                self.deploy(address, *deployer, spec, storage)
            }
            TransactionKind::Execute(tx) => self.execute_transaction(tx, storage),
        }
    }

    /// Instantiate `spec` at `address`, run its deploy hooks and register it
    ///
    /// A spec may produce several contracts (the ledger deploys its first
    /// redemption authority); the first is the primary and deploys the rest.
    fn deploy(
        &mut self,
        address: Address,
        deployer: Address,
        spec: &ContractSpec,
        storage: &mut Storage,
    ) -> ContractResult<ExecutionResult> {
        let contracts = self.loader.load(address, spec)?;

        if let Some(taken) = contracts
            .iter()
            .map(|c| c.address())
            .find(|a| self.registry.contains(a))
        {
            return Err(ContractError::InvalidTransaction(format!(
                "address {taken} already holds a contract"
            )));
        }

        let mut state = ContractState::new(storage);
        for (index, contract) in contracts.iter().enumerate() {
            let creator = if index == 0 { deployer } else { address };
            let mut ctx = CallContext::root(self, &mut state, creator, contract.address());
            if let Err(e) = contract.on_deploy(&mut ctx) {
                warn!(
                    contract = contract.name(),
                    address = %contract.address(),
                    error = %e,
                    "Contract deployment failed in on_deploy"
                );
                state.rollback();
                return Err(e);
            }
        }

        let new_state_root = state.compute_state_root();
        let events = state.commit();

        for contract in contracts {
            info!(
                contract = contract.name(),
                version = contract.version(),
                address = %contract.address(),
                deployer = %deployer,
                "Deployed contract"
            );
            self.registry.register(contract);
        }

        Ok(ExecutionResult {
            new_state_root,
            events,
            output: encode(&address)?,
        })
    }

    /// Execute a contract transaction
    ///
    /// 1. Looks up the target contract
    /// 2. Creates contract state wrapper
    /// 3. Executes contract logic (and any nested calls)
    /// 4. On success: commits state changes
    /// 5. On failure: rolls back all changes
    ///
    /// # Errors
    /// Returns error if the target is unknown or execution fails
    pub fn execute_transaction(
        &self,
        tx: &ContractTransaction,
        storage: &mut Storage,
    ) -> ContractResult<ExecutionResult> {
        let contract = self
            .registry
            .get(&tx.target)
            .ok_or(ContractError::NotFound(tx.target))?;

        let mut state = ContractState::new(storage);

        debug!(
            contract = contract.name(),
            target = %tx.target,
            sender = %tx.sender,
            tx_id = %tx.id,
            "Executing contract transaction"
        );

        let result = {
            let mut ctx = CallContext::root(self, &mut state, tx.sender, tx.target);
            contract.execute(&mut ctx, &tx.input)
        };

        match result {
            Ok(output) => {
                let new_state_root = state.compute_state_root();
                let events = state.commit();

                info!(
                    contract = contract.name(),
                    tx_id = %tx.id,
                    events = events.len(),
                    state_root = %new_state_root,
                    "Contract execution successful"
                );

                Ok(ExecutionResult {
                    new_state_root,
                    events,
                    output,
                })
            }
            Err(e) => {
                warn!(
                    contract = contract.name(),
                    tx_id = %tx.id,
                    code = e.code(),
                    error = %e,
                    "Contract execution failed"
                );
                state.rollback();
                Err(e)
            }
        }
    }

    /// Execute a call and discard every write it made
    ///
    /// Used for read-only queries and for previewing a transaction.
    pub fn call_static(
        &self,
        caller: Address,
        target: Address,
        input: &[u8],
        storage: &mut Storage,
    ) -> ContractResult<Vec<u8>> {
        let contract = self
            .registry
            .get(&target)
            .ok_or(ContractError::NotFound(target))?;

        let mut state = ContractState::new(storage);
        let result = {
            let mut ctx = CallContext::root(self, &mut state, caller, target);
            contract.execute(&mut ctx, input)
        };
        state.rollback();
        result
    }
}

impl Default for TransactionProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALL_DEPTH)
    }
}

/// Check that `nonce` is the sender's next nonce
fn validate_nonce(
    sender: Address,
    nonce: u64,
    nonces: &HashMap<Address, u64>,
) -> ContractResult<()> {
    let expected = nonces.get(&sender).map_or(1, |n| n + 1);
    if nonce != expected {
        return Err(ContractError::InvalidTransaction(format!(
            "Invalid nonce: expected {expected}, got {nonce}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::reward_token::RewardTokenCall;
    use crate::types::Amount;

    fn deploy_token(
        processor: &mut TransactionProcessor,
        storage: &mut Storage,
        deployer: Address,
    ) -> Address {
        let kind = TransactionKind::Deploy {
            spec: ContractSpec::RewardToken {
                name: "FARM Reward Token".to_string(),
                symbol: "FARM".to_string(),
                initial_supply: Amount::from_raw(1_000),
            },
            deployer,
            nonce: 1,
        };
        processor
            .process_transaction(&kind, storage, &HashMap::new())
            .unwrap()
            .decode_output()
            .unwrap()
    }

    #[test]
    fn test_execute_transaction() {
        let mut processor = TransactionProcessor::default();
        let mut storage = Storage::new();
        let sender = Address::dev_account(0);
        let token = deploy_token(&mut processor, &mut storage, sender);

        let tx = ContractTransaction::new(
            sender,
            token,
            encode(&RewardTokenCall::Transfer {
                to: Address::dev_account(1),
                amount: Amount::from_raw(10),
            })
            .unwrap(),
            1,
        );

        let result = processor.execute_transaction(&tx, &mut storage);
        assert!(result.is_ok());
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let mut processor = TransactionProcessor::default();
        let mut storage = Storage::new();
        let sender = Address::dev_account(0);
        let token = deploy_token(&mut processor, &mut storage, sender);
        let snapshot = storage.clone();

        let tx = ContractTransaction::new(
            sender,
            token,
            encode(&RewardTokenCall::Transfer {
                to: Address::dev_account(1),
                amount: Amount::from_raw(1_001),
            })
            .unwrap(),
            1,
        );

        let err = processor.execute_transaction(&tx, &mut storage).unwrap_err();
        assert!(err.is_insufficient_balance());
        assert_eq!(storage, snapshot);
    }

    #[test]
    fn test_nonce_validation() {
        let mut processor = TransactionProcessor::default();
        let mut storage = Storage::new();
        let sender = Address::dev_account(0);

        let kind = TransactionKind::Deploy {
            spec: ContractSpec::RewardToken {
                name: String::new(),
                symbol: String::new(),
                initial_supply: Amount::ZERO,
            },
            deployer: sender,
            nonce: 3,
        };
        let err = processor
            .process_transaction(&kind, &mut storage, &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidTransaction(_)));
        assert_eq!(processor.registry().contract_count(), 0);
    }

    #[test]
    fn test_unknown_target() {
        let processor = TransactionProcessor::default();
        let mut storage = Storage::new();
        let missing = Address::dev_account(9);

        let err = processor
            .call_static(Address::dev_account(0), missing, &[], &mut storage)
            .unwrap_err();
        assert_eq!(err, ContractError::NotFound(missing));
    }
}
