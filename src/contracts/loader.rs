//! Contract Loading Infrastructure
//!
//! Turns a deployment request into contract instances bound to their
//! addresses.

use serde::{Deserialize, Serialize};

use super::ledger::HarvestApContract;
use super::redemption::RedemptionContract;
use super::reward_token::RewardTokenContract;
use super::{Contract, ContractError, ContractResult};
use crate::types::{Address, Amount};

/// Version of the redemption authority the ledger deploys with itself
pub const INITIAL_REDEMPTION_VERSION: u32 = 1;

/// What a deployment transaction creates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractSpec {
    /// ERC-20 style reward token (FARM)
    RewardToken {
        /// Token name
        name: String,
        /// Ticker symbol
        symbol: String,
        /// Supply credited to the deployer
        initial_supply: Amount,
    },
    /// Participation ledger; also deploys its first redemption authority
    HarvestAp {
        /// Administrator allowed to mint and migrate
        admin: Address,
        /// Reward token the authority pays out in
        reward_token: Address,
    },
    /// Standalone redemption authority, e.g. an upgrade to migrate to
    Redemption {
        /// Reward token held in the pool
        reward_token: Address,
        /// Ledger this authority burns from
        ledger: Address,
        /// Implementation version
        version: u32,
    },
}

/// A trait for instantiating contracts
pub trait ContractLoader: Send + Sync {
    /// Instantiate `spec` at `address`
    ///
    /// The first returned contract lives at `address`; any further ones are
    /// children created by it.
    fn load(&self, address: Address, spec: &ContractSpec) -> ContractResult<Vec<Box<dyn Contract>>>;
}

/// Loader for the natively compiled contracts
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeLoader;

impl NativeLoader {
    /// Create a new native loader
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn require_nonzero(address: Address, what: &str) -> ContractResult<()> {
    if address.is_zero() {
        return Err(ContractError::InvalidTransaction(format!(
            "{what} must not be the zero address"
        )));
    }
    Ok(())
}

impl ContractLoader for NativeLoader {
    fn load(
        &self,
        address: Address,
        spec: &ContractSpec,
    ) -> ContractResult<Vec<Box<dyn Contract>>> {
        match spec {
            ContractSpec::RewardToken {
                name,
                symbol,
                initial_supply,
            } => Ok(vec![Box::new(RewardTokenContract::new(
                address,
                name.clone(),
                symbol.clone(),
                *initial_supply,
            ))]),
            ContractSpec::HarvestAp {
                admin,
                reward_token,
            } => {
                require_nonzero(*admin, "admin")?;
                require_nonzero(*reward_token, "reward token")?;

                let ledger = HarvestApContract::new(address, *admin, *reward_token);
                let redemption = RedemptionContract::new(
                    ledger.initial_redemption(),
                    *reward_token,
                    address,
                    INITIAL_REDEMPTION_VERSION,
                );
                Ok(vec![Box::new(ledger), Box::new(redemption)])
            }
            ContractSpec::Redemption {
                reward_token,
                ledger,
                version,
            } => {
                require_nonzero(*reward_token, "reward token")?;
                require_nonzero(*ledger, "ledger")?;

                Ok(vec![Box::new(RedemptionContract::new(
                    address,
                    *reward_token,
                    *ledger,
                    *version,
                ))])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_ap_deploys_redemption() {
        let ap = Address::dev_account(10);
        let contracts = NativeLoader::new()
            .load(
                ap,
                &ContractSpec::HarvestAp {
                    admin: Address::dev_account(0),
                    reward_token: Address::dev_account(11),
                },
            )
            .unwrap();

        assert_eq!(contracts.len(), 2);
        assert_eq!(contracts[0].address(), ap);
        assert_eq!(contracts[0].name(), "HarvestAP");
        assert_eq!(contracts[1].address(), Address::create(&ap, 0));
        assert_eq!(contracts[1].name(), "APRedemption");
    }

    #[test]
    fn test_rejects_zero_admin() {
        let result = NativeLoader::new().load(
            Address::dev_account(10),
            &ContractSpec::HarvestAp {
                admin: Address::ZERO,
                reward_token: Address::dev_account(11),
            },
        );
        assert!(matches!(result, Err(ContractError::InvalidTransaction(_))));
    }
}
