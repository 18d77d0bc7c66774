//! Redemption authority contract (`APRedemption`).
//!
//! Custodies the FARM pool and converts AP into a pro-rata share of it.
//! Every redemption asks the ledger whether this contract is still the
//! active authority before anything else, so a superseded authority reports
//! the authority error even when its pool is already empty.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ledger::{LedgerCall, ERR_ONLY_REDEMPTION};
use super::processor::CallContext;
use super::reward_token::RewardTokenCall;
use super::{decode, encode, Contract, ContractError, ContractResult};
use crate::tokenomics::{redemption_payout, RedemptionQuote};
use crate::types::{Address, Amount};

/// Calls accepted by a redemption authority
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RedemptionCall {
    /// Burn `amount` of the caller's AP for reward tokens -> `Amount` paid
    Redeem {
        /// Units to redeem
        amount: Amount,
    },
    /// Send the whole pool to `to` -> `Amount` moved (ledger only)
    Migrate {
        /// Next authority
        to: Address,
    },
    /// Preview redeeming `amount` against the live pool -> `RedemptionQuote`
    Quote {
        /// Units to redeem
        amount: Amount,
    },
    /// Reward tokens held -> `Amount`
    Pool,
    /// Ledger this authority burns from -> `Address`
    Ledger,
    /// Reward token -> `Address`
    RewardToken,
}

/// `Redeemed` event payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeemed {
    /// Holder whose AP was burned
    pub holder: Address,
    /// AP burned
    pub amount: Amount,
    /// Reward tokens paid
    pub payout: Amount,
}

/// A redemption authority bound to one ledger and one reward token
pub struct RedemptionContract {
    address: Address,
    reward_token: Address,
    ledger: Address,
    version: u32,
}

impl RedemptionContract {
    /// Create an authority bound to `address`
    #[must_use]
    pub fn new(address: Address, reward_token: Address, ledger: Address, version: u32) -> Self {
        Self {
            address,
            reward_token,
            ledger,
            version,
        }
    }

    fn pool(&self, ctx: &mut CallContext<'_, '_>) -> ContractResult<Amount> {
        ctx.call_typed(
            self.reward_token,
            &RewardTokenCall::BalanceOf {
                holder: self.address,
            },
        )
    }

    fn quote(
        &self,
        ctx: &mut CallContext<'_, '_>,
        amount: Amount,
    ) -> ContractResult<RedemptionQuote> {
        let supply: Amount = ctx.call_typed(self.ledger, &LedgerCall::TotalSupply)?;
        let pool = self.pool(ctx)?;
        RedemptionQuote::new(amount, pool, supply).ok_or(ContractError::Overflow)
    }

    fn execute_redeem(
        &self,
        ctx: &mut CallContext<'_, '_>,
        amount: Amount,
    ) -> ContractResult<Amount> {
        let holder = ctx.caller();

        let active: Address = ctx.call_typed(self.ledger, &LedgerCall::Redemption)?;
        if active != self.address {
            return Err(ContractError::Unauthorized(ERR_ONLY_REDEMPTION.to_string()));
        }

        let have: Amount = ctx.call_typed(self.ledger, &LedgerCall::BalanceOf { holder })?;
        if have < amount {
            return Err(ContractError::InsufficientBalance { need: amount, have });
        }

        let supply: Amount = ctx.call_typed(self.ledger, &LedgerCall::TotalSupply)?;
        let pool = self.pool(ctx)?;
        let payout = redemption_payout(amount, pool, supply).ok_or(ContractError::Overflow)?;

        debug!(
            redemption = %self.address,
            holder = %holder,
            amount = %amount,
            pool = %pool,
            supply = %supply,
            payout = %payout,
            "Computed redemption payout"
        );

        ctx.call_typed::<_, ()>(self.ledger, &LedgerCall::Redeem { holder, amount })?;
        ctx.call_typed::<_, ()>(
            self.reward_token,
            &RewardTokenCall::Transfer {
                to: holder,
                amount: payout,
            },
        )?;

        ctx.emit(
            "Redeemed",
            &Redeemed {
                holder,
                amount,
                payout,
            },
        )?;

        info!(
            redemption = %self.address,
            holder = %holder,
            amount = %amount,
            payout = %payout,
            "Redeemed participation"
        );

        Ok(payout)
    }

    fn execute_migrate(
        &self,
        ctx: &mut CallContext<'_, '_>,
        to: Address,
    ) -> ContractResult<Amount> {
        if ctx.caller() != self.ledger {
            return Err(ContractError::Unauthorized(format!(
                "APRedemption/migrate - only {} may migrate this pool",
                self.ledger
            )));
        }

        let pool = self.pool(ctx)?;
        ctx.call_typed::<_, ()>(
            self.reward_token,
            &RewardTokenCall::Transfer { to, amount: pool },
        )?;
        Ok(pool)
    }
}

impl Contract for RedemptionContract {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &str {
        "APRedemption"
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn execute(&self, ctx: &mut CallContext<'_, '_>, input: &[u8]) -> ContractResult<Vec<u8>> {
        match decode::<RedemptionCall>(input)? {
            RedemptionCall::Redeem { amount } => encode(&self.execute_redeem(ctx, amount)?),
            RedemptionCall::Migrate { to } => encode(&self.execute_migrate(ctx, to)?),
            RedemptionCall::Quote { amount } => encode(&self.quote(ctx, amount)?),
            RedemptionCall::Pool => encode(&self.pool(ctx)?),
            RedemptionCall::Ledger => encode(&self.ledger),
            RedemptionCall::RewardToken => encode(&self.reward_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::loader::ContractSpec;
    use crate::state::ChainState;

    struct Fixture {
        chain: ChainState,
        admin: Address,
        farm: Address,
        ap: Address,
        redemption: Address,
    }

    fn fixture(pool: u128) -> Fixture {
        let mut chain = ChainState::default();
        let admin = Address::dev_account(0);
        let farm = chain
            .deploy(
                admin,
                ContractSpec::RewardToken {
                    name: "FARM Reward Token".to_string(),
                    symbol: "FARM".to_string(),
                    initial_supply: Amount::ZERO,
                },
            )
            .unwrap();
        let ap = chain
            .deploy(
                admin,
                ContractSpec::HarvestAp {
                    admin,
                    reward_token: farm,
                },
            )
            .unwrap();
        let redemption = Address::create(&ap, 0);
        chain
            .send_typed::<_, ()>(
                admin,
                farm,
                &RewardTokenCall::SetBalance {
                    holder: redemption,
                    amount: Amount::from_raw(pool),
                },
            )
            .unwrap();

        Fixture {
            chain,
            admin,
            farm,
            ap,
            redemption,
        }
    }

    #[test]
    fn test_views() {
        let mut f = fixture(1_000);

        let ledger: Address = f
            .chain
            .call_static(f.admin, f.redemption, &RedemptionCall::Ledger)
            .unwrap();
        let token: Address = f
            .chain
            .call_static(f.admin, f.redemption, &RedemptionCall::RewardToken)
            .unwrap();
        let pool: Amount = f
            .chain
            .call_static(f.admin, f.redemption, &RedemptionCall::Pool)
            .unwrap();

        assert_eq!(ledger, f.ap);
        assert_eq!(token, f.farm);
        assert_eq!(pool.raw(), 1_000);
        assert_eq!(
            f.chain.contract_info(&f.redemption),
            Some(("APRedemption".to_string(), 1))
        );
    }

    #[test]
    fn test_migrate_only_callable_by_ledger() {
        let mut f = fixture(1_000);
        let root = f.chain.state_root();

        for caller in [f.admin, Address::dev_account(5)] {
            let err = f
                .chain
                .send_typed::<_, Amount>(
                    caller,
                    f.redemption,
                    &RedemptionCall::Migrate { to: caller },
                )
                .unwrap_err();
            assert!(err.is_unauthorized());
        }

        assert_eq!(f.chain.state_root(), root);
        let pool: Amount = f
            .chain
            .call_static(f.admin, f.redemption, &RedemptionCall::Pool)
            .unwrap();
        assert_eq!(pool.raw(), 1_000);
    }

    #[test]
    fn test_quote_uses_live_supply() {
        let mut f = fixture(900);
        f.chain
            .send_typed::<_, ()>(
                f.admin,
                f.ap,
                &LedgerCall::Mint {
                    holder: f.admin,
                    amount: Amount::from_raw(30),
                },
            )
            .unwrap();

        let quote: RedemptionQuote = f
            .chain
            .call_static(
                f.admin,
                f.redemption,
                &RedemptionCall::Quote {
                    amount: Amount::from_raw(10),
                },
            )
            .unwrap();

        assert_eq!(quote.payout.raw(), 300);
        assert_eq!(quote.pool_after.raw(), 600);
        assert_eq!(quote.supply_after.raw(), 20);
    }
}
