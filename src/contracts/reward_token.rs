//! Reward token contract (FARM).
//!
//! A minimal ERC-20 shaped ledger. Besides `transfer` it exposes
//! `SetBalance`, a fixture operation that funds a custodian directly; it is
//! used to seed the redemption pool in deployments and tests.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::balances::BalanceBook;
use super::processor::CallContext;
use super::{decode, encode, Contract, ContractResult};
use crate::types::{Address, Amount};

const BALANCE_PREFIX: &[u8] = b"erc20:balance:";
const KEY_TOTAL_SUPPLY: &[u8] = b"erc20:total_supply";

/// Calls accepted by the reward token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RewardTokenCall {
    /// Balance of `holder` -> `Amount`
    BalanceOf {
        /// Account to query
        holder: Address,
    },
    /// Total supply -> `Amount`
    TotalSupply,
    /// Move tokens from the caller to `to` -> `()`
    Transfer {
        /// Recipient
        to: Address,
        /// Amount to move
        amount: Amount,
    },
    /// Overwrite `holder`'s balance -> `()` (fixture only)
    SetBalance {
        /// Account to fund
        holder: Address,
        /// New balance
        amount: Amount,
    },
    /// Token name -> `String`
    Name,
    /// Token symbol -> `String`
    Symbol,
}

/// `Transfer` event payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    /// Source account
    pub from: Address,
    /// Destination account
    pub to: Address,
    /// Amount moved
    pub amount: Amount,
}

/// FARM reward token
pub struct RewardTokenContract {
    address: Address,
    name: String,
    symbol: String,
    initial_supply: Amount,
}

impl RewardTokenContract {
    /// Create the token contract bound to `address`
    #[must_use]
    pub fn new(address: Address, name: String, symbol: String, initial_supply: Amount) -> Self {
        Self {
            address,
            name,
            symbol,
            initial_supply,
        }
    }

    fn book(&self) -> BalanceBook {
        BalanceBook::new(self.address, BALANCE_PREFIX, KEY_TOTAL_SUPPLY)
    }
}

impl Contract for RewardTokenContract {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &str {
        "RewardToken"
    }

    fn version(&self) -> u32 {
        1
    }

    fn execute(&self, ctx: &mut CallContext<'_, '_>, input: &[u8]) -> ContractResult<Vec<u8>> {
        let book = self.book();

        match decode::<RewardTokenCall>(input)? {
            RewardTokenCall::BalanceOf { holder } => {
                encode(&book.balance_of(ctx.state(), &holder)?)
            }
            RewardTokenCall::TotalSupply => encode(&book.total_supply(ctx.state())?),
            RewardTokenCall::Transfer { to, amount } => {
                let from = ctx.caller();
                book.transfer(ctx.state_mut(), &from, &to, amount)?;
                ctx.emit("Transfer", &TokenTransfer { from, to, amount })?;
                encode(&())
            }
            RewardTokenCall::SetBalance { holder, amount } => {
                debug!(
                    token = %self.address,
                    holder = %holder,
                    amount = %amount,
                    "Setting balance"
                );
                book.set_balance(ctx.state_mut(), &holder, amount)?;
                encode(&())
            }
            RewardTokenCall::Name => encode(&self.name),
            RewardTokenCall::Symbol => encode(&self.symbol),
        }
    }

    fn on_deploy(&self, ctx: &mut CallContext<'_, '_>) -> ContractResult<()> {
        if self.initial_supply.is_zero() {
            return Ok(());
        }

        let deployer = ctx.caller();
        self.book()
            .mint(ctx.state_mut(), &deployer, self.initial_supply)?;
        ctx.emit(
            "Transfer",
            &TokenTransfer {
                from: Address::ZERO,
                to: deployer,
                amount: self.initial_supply,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::loader::ContractSpec;
    use crate::state::ChainState;

    fn deploy_token(chain: &mut ChainState, deployer: Address, initial: u128) -> Address {
        chain
            .deploy(
                deployer,
                ContractSpec::RewardToken {
                    name: "FARM Reward Token".to_string(),
                    symbol: "FARM".to_string(),
                    initial_supply: Amount::from_raw(initial),
                },
            )
            .unwrap()
    }

    fn query<T: serde::de::DeserializeOwned>(
        chain: &mut ChainState,
        token: Address,
        call: &RewardTokenCall,
    ) -> T {
        chain.call_static(Address::ZERO, token, call).unwrap()
    }

    #[test]
    fn test_initial_supply_goes_to_deployer() {
        let mut chain = ChainState::default();
        let deployer = Address::dev_account(0);
        let token = deploy_token(&mut chain, deployer, 1_000);

        let balance: Amount = query(
            &mut chain,
            token,
            &RewardTokenCall::BalanceOf { holder: deployer },
        );
        let supply: Amount = query(&mut chain, token, &RewardTokenCall::TotalSupply);
        let name: String = query(&mut chain, token, &RewardTokenCall::Name);
        let symbol: String = query(&mut chain, token, &RewardTokenCall::Symbol);

        assert_eq!(balance.raw(), 1_000);
        assert_eq!(supply.raw(), 1_000);
        assert_eq!(name, "FARM Reward Token");
        assert_eq!(symbol, "FARM");
    }

    #[test]
    fn test_set_balance_adjusts_supply() {
        let mut chain = ChainState::default();
        let deployer = Address::dev_account(0);
        let custodian = Address::dev_account(3);
        let token = deploy_token(&mut chain, deployer, 1_000);

        // Raise a fresh balance: supply grows by the difference
        chain
            .send_typed::<_, ()>(
                deployer,
                token,
                &RewardTokenCall::SetBalance {
                    holder: custodian,
                    amount: Amount::from_raw(500),
                },
            )
            .unwrap();
        let supply: Amount = query(&mut chain, token, &RewardTokenCall::TotalSupply);
        assert_eq!(supply.raw(), 1_500);

        // Lower an existing balance: supply shrinks by the difference
        chain
            .send_typed::<_, ()>(
                deployer,
                token,
                &RewardTokenCall::SetBalance {
                    holder: deployer,
                    amount: Amount::from_raw(200),
                },
            )
            .unwrap();
        let supply: Amount = query(&mut chain, token, &RewardTokenCall::TotalSupply);
        let balance: Amount = query(
            &mut chain,
            token,
            &RewardTokenCall::BalanceOf { holder: deployer },
        );
        assert_eq!(supply.raw(), 700);
        assert_eq!(balance.raw(), 200);
    }

    #[test]
    fn test_transfer_emits_event() {
        let mut chain = ChainState::default();
        let deployer = Address::dev_account(0);
        let to = Address::dev_account(1);
        let token = deploy_token(&mut chain, deployer, 100);

        let ((), result) = chain
            .send_typed(
                deployer,
                token,
                &RewardTokenCall::Transfer {
                    to,
                    amount: Amount::from_raw(40),
                },
            )
            .unwrap();

        let event: TokenTransfer = result
            .events_with_topic("Transfer")
            .next()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(
            event,
            TokenTransfer {
                from: deployer,
                to,
                amount: Amount::from_raw(40),
            }
        );
    }
}
