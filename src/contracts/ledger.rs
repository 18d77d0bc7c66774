//! Participation ledger contract (`HarvestAP`).
//!
//! Holds the AP balances, the administrator, and the reference to the one
//! redemption authority currently allowed to burn AP. The authority check
//! lives here, on the burn path itself, so a superseded authority is inert
//! no matter which entry point it is reached through.
//!
//! The administrator's `SetRedemption` is the migration controller: inside a
//! single transaction it drains the old authority's reward pool into the new
//! one and repoints the reference.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::balances::BalanceBook;
use super::processor::CallContext;
use super::redemption::RedemptionCall;
use super::reward_token::TokenTransfer;
use super::{decode, encode, Contract, ContractError, ContractResult};
use crate::types::{Address, Amount};

/// Rejection for any burn not coming from the active redemption authority
pub const ERR_ONLY_REDEMPTION: &str =
    "HarvestAP/redeem - This function may only be called by APRedemption";

/// Rejection for administrator-only operations
pub const ERR_ONLY_ADMIN: &str = "HarvestAP - caller is not the administrator";

// Storage keys
const KEY_ADMIN: &[u8] = b"ap:admin";
const KEY_REDEMPTION: &[u8] = b"ap:redemption";
const KEY_REDEMPTION_VERSION: &[u8] = b"ap:redemption_version";
const KEY_TOTAL_SUPPLY: &[u8] = b"ap:total_supply";
const BALANCE_PREFIX: &[u8] = b"ap:balance:";

/// Calls accepted by the participation ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LedgerCall {
    /// Credit new AP to `holder` -> `()` (admin only)
    Mint {
        /// Recipient
        holder: Address,
        /// Units to create
        amount: Amount,
    },
    /// AP balance of `holder` -> `Amount`
    BalanceOf {
        /// Account to query
        holder: Address,
    },
    /// Outstanding AP -> `Amount`
    TotalSupply,
    /// Burn `holder`'s AP -> `()` (active redemption authority only)
    Redeem {
        /// Holder being redeemed for
        holder: Address,
        /// Units to burn
        amount: Amount,
    },
    /// Replace the redemption authority -> `Amount` migrated (admin only)
    SetRedemption {
        /// New authority
        redemption: Address,
    },
    /// Hand the administrator role to `new_admin` -> `()` (admin only)
    TransferAdmin {
        /// Next administrator
        new_admin: Address,
    },
    /// Active redemption authority -> `Address`
    Redemption,
    /// Number of authorities installed so far -> `u64`
    RedemptionVersion,
    /// Administrator -> `Address`
    Admin,
    /// Reward token -> `Address`
    RewardToken,
}

/// `RedemptionReplaced` event payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionReplaced {
    /// Authority that was revoked
    pub old: Address,
    /// Authority now active
    pub new: Address,
    /// Reward tokens moved from `old` to `new`
    pub migrated: Amount,
    /// Authority version after the swap
    pub version: u64,
}

/// `AdminTransferred` event payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminTransferred {
    /// Previous administrator
    pub previous: Address,
    /// New administrator
    pub new: Address,
}

/// The `HarvestAP` participation ledger
pub struct HarvestApContract {
    address: Address,
    initial_admin: Address,
    reward_token: Address,
}

impl HarvestApContract {
    /// Create the ledger bound to `address`
    #[must_use]
    pub fn new(address: Address, admin: Address, reward_token: Address) -> Self {
        Self {
            address,
            initial_admin: admin,
            reward_token,
        }
    }

    /// Address of the authority deployed alongside the ledger
    #[must_use]
    pub fn initial_redemption(&self) -> Address {
        Address::create(&self.address, 0)
    }

    fn book(&self) -> BalanceBook {
        BalanceBook::new(self.address, BALANCE_PREFIX, KEY_TOTAL_SUPPLY)
    }

    fn admin(&self, ctx: &CallContext<'_, '_>) -> ContractResult<Address> {
        ctx.state()
            .read_value(&self.address, KEY_ADMIN)?
            .ok_or_else(|| ContractError::InvalidTransaction("ledger not initialized".to_string()))
    }

    fn redemption(&self, ctx: &CallContext<'_, '_>) -> ContractResult<Address> {
        ctx.state()
            .read_value(&self.address, KEY_REDEMPTION)?
            .ok_or_else(|| ContractError::InvalidTransaction("ledger not initialized".to_string()))
    }

    fn redemption_version(&self, ctx: &CallContext<'_, '_>) -> ContractResult<u64> {
        Ok(ctx
            .state()
            .read_value(&self.address, KEY_REDEMPTION_VERSION)?
            .unwrap_or(0))
    }

    fn require_admin(&self, ctx: &CallContext<'_, '_>) -> ContractResult<()> {
        if ctx.caller() != self.admin(ctx)? {
            return Err(ContractError::Unauthorized(ERR_ONLY_ADMIN.to_string()));
        }
        Ok(())
    }

    fn execute_mint(
        &self,
        ctx: &mut CallContext<'_, '_>,
        holder: Address,
        amount: Amount,
    ) -> ContractResult<()> {
        self.require_admin(ctx)?;
        if holder.is_zero() {
            return Err(ContractError::InvalidTransaction(
                "cannot mint to the zero address".to_string(),
            ));
        }

        self.book().mint(ctx.state_mut(), &holder, amount)?;
        ctx.emit(
            "Transfer",
            &TokenTransfer {
                from: Address::ZERO,
                to: holder,
                amount,
            },
        )
    }

    fn execute_redeem(
        &self,
        ctx: &mut CallContext<'_, '_>,
        holder: Address,
        amount: Amount,
    ) -> ContractResult<()> {
        if ctx.caller() != self.redemption(ctx)? {
            return Err(ContractError::Unauthorized(ERR_ONLY_REDEMPTION.to_string()));
        }

        self.book().burn(ctx.state_mut(), &holder, amount)?;
        ctx.emit(
            "Transfer",
            &TokenTransfer {
                from: holder,
                to: Address::ZERO,
                amount,
            },
        )
    }

    fn execute_set_redemption(
        &self,
        ctx: &mut CallContext<'_, '_>,
        new: Address,
    ) -> ContractResult<Amount> {
        self.require_admin(ctx)?;

        if new.is_zero() {
            return Err(ContractError::InvalidTransaction(
                "redemption must not be the zero address".to_string(),
            ));
        }
        let old = self.redemption(ctx)?;
        if new == old {
            return Err(ContractError::InvalidTransaction(format!(
                "{new} is already the active redemption"
            )));
        }

        // The replacement must be an authority that burns from this ledger
        let bound_to = ctx
            .call_typed::<_, Address>(new, &RedemptionCall::Ledger)
            .map_err(|_| {
                ContractError::InvalidTransaction(format!("{new} is not a redemption contract"))
            })?;
        if bound_to != self.address {
            return Err(ContractError::InvalidTransaction(format!(
                "{new} redeems against {bound_to}, not this ledger"
            )));
        }
        // ...and pays out in the token the pool is held in
        let pays_in: Address = ctx.call_typed(new, &RedemptionCall::RewardToken)?;
        if pays_in != self.reward_token {
            return Err(ContractError::InvalidTransaction(format!(
                "{new} pays in {pays_in}, not {}",
                self.reward_token
            )));
        }

        let migrated: Amount = ctx.call_typed(old, &RedemptionCall::Migrate { to: new })?;

        let version = self.redemption_version(ctx)? + 1;
        let this = self.address;
        ctx.state_mut()
            .write_value(this, KEY_REDEMPTION.to_vec(), &new)?;
        ctx.state_mut()
            .write_value(this, KEY_REDEMPTION_VERSION.to_vec(), &version)?;

        ctx.emit(
            "RedemptionReplaced",
            &RedemptionReplaced {
                old,
                new,
                migrated,
                version,
            },
        )?;

        info!(
            ledger = %self.address,
            old = %old,
            new = %new,
            migrated = %migrated,
            version,
            "Redemption authority replaced"
        );

        Ok(migrated)
    }

    fn execute_transfer_admin(
        &self,
        ctx: &mut CallContext<'_, '_>,
        new_admin: Address,
    ) -> ContractResult<()> {
        self.require_admin(ctx)?;
        if new_admin.is_zero() {
            return Err(ContractError::InvalidTransaction(
                "admin must not be the zero address".to_string(),
            ));
        }

        let previous = ctx.caller();
        let this = self.address;
        ctx.state_mut()
            .write_value(this, KEY_ADMIN.to_vec(), &new_admin)?;
        ctx.emit(
            "AdminTransferred",
            &AdminTransferred {
                previous,
                new: new_admin,
            },
        )
    }
}

impl Contract for HarvestApContract {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &str {
        "HarvestAP"
    }

    fn version(&self) -> u32 {
        1
    }

    fn execute(&self, ctx: &mut CallContext<'_, '_>, input: &[u8]) -> ContractResult<Vec<u8>> {
        match decode::<LedgerCall>(input)? {
            LedgerCall::Mint { holder, amount } => encode(&self.execute_mint(ctx, holder, amount)?),
            LedgerCall::BalanceOf { holder } => {
                encode(&self.book().balance_of(ctx.state(), &holder)?)
            }
            LedgerCall::TotalSupply => encode(&self.book().total_supply(ctx.state())?),
            LedgerCall::Redeem { holder, amount } => {
                encode(&self.execute_redeem(ctx, holder, amount)?)
            }
            LedgerCall::SetRedemption { redemption } => {
                encode(&self.execute_set_redemption(ctx, redemption)?)
            }
            LedgerCall::TransferAdmin { new_admin } => {
                encode(&self.execute_transfer_admin(ctx, new_admin)?)
            }
            LedgerCall::Redemption => encode(&self.redemption(ctx)?),
            LedgerCall::RedemptionVersion => encode(&self.redemption_version(ctx)?),
            LedgerCall::Admin => encode(&self.admin(ctx)?),
            LedgerCall::RewardToken => encode(&self.reward_token),
        }
    }

    fn on_deploy(&self, ctx: &mut CallContext<'_, '_>) -> ContractResult<()> {
        let this = self.address;
        let redemption = self.initial_redemption();
        let state = ctx.state_mut();
        state.write_value(this, KEY_ADMIN.to_vec(), &self.initial_admin)?;
        state.write_value(this, KEY_REDEMPTION.to_vec(), &redemption)?;
        state.write_value(this, KEY_REDEMPTION_VERSION.to_vec(), &1u64)?;
        Ok(())
    }
}
