//! Storage-backed balance book shared by the participation and reward tokens.

use super::state::ContractState;
use super::{ContractError, ContractResult};
use crate::types::{Address, Amount};

/// Balances plus a running total supply, kept under one contract's storage
#[derive(Clone, Copy, Debug)]
pub struct BalanceBook {
    contract: Address,
    balance_prefix: &'static [u8],
    supply_key: &'static [u8],
}

impl BalanceBook {
    /// Balance book stored under `contract`
    #[must_use]
    pub const fn new(
        contract: Address,
        balance_prefix: &'static [u8],
        supply_key: &'static [u8],
    ) -> Self {
        Self {
            contract,
            balance_prefix,
            supply_key,
        }
    }

    fn balance_key(&self, holder: &Address) -> Vec<u8> {
        let mut key = self.balance_prefix.to_vec();
        key.extend_from_slice(holder.as_bytes());
        key
    }

    /// Balance of `holder`
    pub fn balance_of(
        &self,
        state: &ContractState<'_>,
        holder: &Address,
    ) -> ContractResult<Amount> {
        Ok(state
            .read_value(&self.contract, &self.balance_key(holder))?
            .unwrap_or(Amount::ZERO))
    }

    /// Sum of all balances
    pub fn total_supply(&self, state: &ContractState<'_>) -> ContractResult<Amount> {
        Ok(state
            .read_value(&self.contract, self.supply_key)?
            .unwrap_or(Amount::ZERO))
    }

    fn write_balance(
        &self,
        state: &mut ContractState<'_>,
        holder: &Address,
        amount: Amount,
    ) -> ContractResult<()> {
        let key = self.balance_key(holder);
        if amount.is_zero() {
            state.storage_delete(self.contract, key);
            Ok(())
        } else {
            state.write_value(self.contract, key, &amount)
        }
    }

    fn write_supply(&self, state: &mut ContractState<'_>, supply: Amount) -> ContractResult<()> {
        state.write_value(self.contract, self.supply_key.to_vec(), &supply)
    }

    /// Create `amount` new units for `holder`
    pub fn mint(
        &self,
        state: &mut ContractState<'_>,
        holder: &Address,
        amount: Amount,
    ) -> ContractResult<()> {
        let supply = self
            .total_supply(state)?
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        let balance = self
            .balance_of(state, holder)?
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;

        self.write_balance(state, holder, balance)?;
        self.write_supply(state, supply)
    }

    /// Destroy `amount` units held by `holder`
    ///
    /// # Errors
    /// `InsufficientBalance` if `holder` has less than `amount`
    pub fn burn(
        &self,
        state: &mut ContractState<'_>,
        holder: &Address,
        amount: Amount,
    ) -> ContractResult<()> {
        let have = self.balance_of(state, holder)?;
        let balance = have
            .checked_sub(amount)
            .ok_or(ContractError::InsufficientBalance { need: amount, have })?;
        let supply = self
            .total_supply(state)?
            .checked_sub(amount)
            .ok_or(ContractError::Overflow)?;

        self.write_balance(state, holder, balance)?;
        self.write_supply(state, supply)
    }

    /// Move `amount` from `from` to `to`
    ///
    /// # Errors
    /// `InsufficientBalance` if `from` has less than `amount`
    pub fn transfer(
        &self,
        state: &mut ContractState<'_>,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> ContractResult<()> {
        let have = self.balance_of(state, from)?;
        let from_balance = have
            .checked_sub(amount)
            .ok_or(ContractError::InsufficientBalance { need: amount, have })?;
        self.write_balance(state, from, from_balance)?;

        let to_balance = self
            .balance_of(state, to)?
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        self.write_balance(state, to, to_balance)
    }

    /// Overwrite `holder`'s balance, adjusting total supply by the difference
    pub fn set_balance(
        &self,
        state: &mut ContractState<'_>,
        holder: &Address,
        amount: Amount,
    ) -> ContractResult<()> {
        let old = self.balance_of(state, holder)?;
        let supply = self.total_supply(state)?;
        let supply = if amount >= old {
            supply.checked_add(amount.saturating_sub(old))
        } else {
            supply.checked_sub(old.saturating_sub(amount))
        }
        .ok_or(ContractError::Overflow)?;

        self.write_balance(state, holder, amount)?;
        self.write_supply(state, supply)
    }
}
