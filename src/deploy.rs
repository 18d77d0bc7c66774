//! Deployment of the HarvestAP contract graph.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ChainClient;
use crate::contracts::loader::ContractSpec;
use crate::contracts::ContractResult;
use crate::types::{Address, Amount};

/// Version given to upgrade authorities deployed next to the original
pub const UPGRADE_REDEMPTION_VERSION: u32 = 2;

/// Addresses of a deployed system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Administrator of the ledger
    pub admin: Address,
    /// FARM reward token
    pub farm: Address,
    /// `HarvestAP` participation ledger
    pub ap: Address,
    /// Authority deployed with the ledger and funded with the pool
    pub redemption: Address,
    /// Second authority bound to the same ledger, ready to migrate to
    pub upgrade: Address,
}

impl Deployment {
    /// Deploy FARM, the ledger with its authority, and an upgrade authority,
    /// then fund the active authority with `pool` FARM.
    pub async fn deploy(
        client: &ChainClient,
        admin: Address,
        pool: Amount,
    ) -> ContractResult<Self> {
        let farm = client
            .deploy(
                admin,
                ContractSpec::RewardToken {
                    name: "FARM Reward Token".to_string(),
                    symbol: "FARM".to_string(),
                    initial_supply: Amount::ZERO,
                },
            )
            .await?;

        let ap = client
            .deploy(
                admin,
                ContractSpec::HarvestAp {
                    admin,
                    reward_token: farm,
                },
            )
            .await?;
        let redemption = client.redemption(ap).await?;

        let upgrade = Self::deploy_upgrade(client, admin, farm, ap).await?;

        client.fund_pool(admin, farm, redemption, pool).await?;

        info!(
            farm = %farm,
            ap = %ap,
            redemption = %redemption,
            upgrade = %upgrade,
            pool = %pool,
            "Deployed HarvestAP system"
        );

        Ok(Self {
            admin,
            farm,
            ap,
            redemption,
            upgrade,
        })
    }

    /// Deploy another authority bound to `ap`
    pub async fn deploy_upgrade(
        client: &ChainClient,
        deployer: Address,
        farm: Address,
        ap: Address,
    ) -> ContractResult<Address> {
        client
            .deploy(
                deployer,
                ContractSpec::Redemption {
                    reward_token: farm,
                    ledger: ap,
                    version: UPGRADE_REDEMPTION_VERSION,
                },
            )
            .await
    }
}
