//! Async contract-call client over shared chain state.
//!
//! Every operation takes the chain's write lock for its whole
//! read-compute-write sequence, so transactions from concurrent tasks are
//! serialized and never observe each other half-applied. Pure chain
//! metadata (state root, nonces, receipts) is read under the read lock.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::contracts::ledger::LedgerCall;
use crate::contracts::loader::ContractSpec;
use crate::contracts::redemption::RedemptionCall;
use crate::contracts::reward_token::RewardTokenCall;
use crate::contracts::{ContractResult, ExecutionResult};
use crate::crypto::Hash;
use crate::state::{ChainState, Receipt};
use crate::tokenomics::RedemptionQuote;
use crate::types::{Address, Amount};

/// Handle to a shared chain; cheap to clone
#[derive(Clone)]
pub struct ChainClient {
    state: Arc<RwLock<ChainState>>,
}

impl ChainClient {
    /// Wrap a chain state
    #[must_use]
    pub fn new(state: ChainState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    // --- Generic calls ---

    /// Deploy a contract
    pub async fn deploy(&self, deployer: Address, spec: ContractSpec) -> ContractResult<Address> {
        self.state.write().await.deploy(deployer, spec)
    }

    /// Send a state-changing call and decode its return value
    pub async fn send<I: Serialize, O: DeserializeOwned>(
        &self,
        sender: Address,
        target: Address,
        call: &I,
    ) -> ContractResult<(O, ExecutionResult)> {
        self.state.write().await.send_typed(sender, target, call)
    }

    /// Execute a call without committing it
    pub async fn call<I: Serialize, O: DeserializeOwned>(
        &self,
        caller: Address,
        target: Address,
        call: &I,
    ) -> ContractResult<O> {
        self.state.write().await.call_static(caller, target, call)
    }

    // --- Participation ledger ---

    /// Mint AP to `holder` (admin only)
    pub async fn mint(
        &self,
        admin: Address,
        ledger: Address,
        holder: Address,
        amount: Amount,
    ) -> ContractResult<ExecutionResult> {
        let ((), result) = self
            .send(admin, ledger, &LedgerCall::Mint { holder, amount })
            .await?;
        Ok(result)
    }

    /// AP balance of `holder`
    pub async fn balance_of(&self, ledger: Address, holder: Address) -> ContractResult<Amount> {
        self.call(holder, ledger, &LedgerCall::BalanceOf { holder })
            .await
    }

    /// Outstanding AP
    pub async fn total_supply(&self, ledger: Address) -> ContractResult<Amount> {
        self.call(Address::ZERO, ledger, &LedgerCall::TotalSupply)
            .await
    }

    /// Active redemption authority
    pub async fn redemption(&self, ledger: Address) -> ContractResult<Address> {
        self.call(Address::ZERO, ledger, &LedgerCall::Redemption)
            .await
    }

    /// Number of authorities the ledger has installed
    pub async fn redemption_version(&self, ledger: Address) -> ContractResult<u64> {
        self.call(Address::ZERO, ledger, &LedgerCall::RedemptionVersion)
            .await
    }

    /// Ledger administrator
    pub async fn admin(&self, ledger: Address) -> ContractResult<Address> {
        self.call(Address::ZERO, ledger, &LedgerCall::Admin).await
    }

    /// Call the ledger's burn path directly as `caller`
    ///
    /// Only the active redemption authority may burn; any other caller is
    /// rejected.
    pub async fn ledger_redeem(
        &self,
        caller: Address,
        ledger: Address,
        holder: Address,
        amount: Amount,
    ) -> ContractResult<ExecutionResult> {
        let ((), result) = self
            .send(caller, ledger, &LedgerCall::Redeem { holder, amount })
            .await?;
        Ok(result)
    }

    /// Replace the redemption authority (admin only); returns the pool moved
    pub async fn set_redemption(
        &self,
        admin: Address,
        ledger: Address,
        redemption: Address,
    ) -> ContractResult<Amount> {
        let (migrated, _) = self
            .send(admin, ledger, &LedgerCall::SetRedemption { redemption })
            .await?;
        Ok(migrated)
    }

    /// Hand the administrator role over (admin only)
    pub async fn transfer_admin(
        &self,
        admin: Address,
        ledger: Address,
        new_admin: Address,
    ) -> ContractResult<ExecutionResult> {
        let ((), result) = self
            .send(admin, ledger, &LedgerCall::TransferAdmin { new_admin })
            .await?;
        Ok(result)
    }

    // --- Redemption authority ---

    /// Redeem `amount` of `holder`'s AP through `redemption`; returns the payout
    pub async fn redeem(
        &self,
        holder: Address,
        redemption: Address,
        amount: Amount,
    ) -> ContractResult<Amount> {
        let (payout, _) = self
            .send(holder, redemption, &RedemptionCall::Redeem { amount })
            .await?;
        Ok(payout)
    }

    /// Preview a redemption of `amount` through `redemption`
    pub async fn quote(
        &self,
        redemption: Address,
        amount: Amount,
    ) -> ContractResult<RedemptionQuote> {
        self.call(Address::ZERO, redemption, &RedemptionCall::Quote { amount })
            .await
    }

    /// Reward tokens held by `redemption`
    pub async fn pool(&self, redemption: Address) -> ContractResult<Amount> {
        self.call(Address::ZERO, redemption, &RedemptionCall::Pool)
            .await
    }

    /// Token `redemption` pays out in
    pub async fn authority_reward_token(&self, redemption: Address) -> ContractResult<Address> {
        self.call(Address::ZERO, redemption, &RedemptionCall::RewardToken)
            .await
    }

    // --- Reward token ---

    /// Name and symbol of a reward token
    pub async fn token_metadata(&self, reward_token: Address) -> ContractResult<(String, String)> {
        let name = self
            .call(Address::ZERO, reward_token, &RewardTokenCall::Name)
            .await?;
        let symbol = self
            .call(Address::ZERO, reward_token, &RewardTokenCall::Symbol)
            .await?;
        Ok((name, symbol))
    }

    /// Set `custodian`'s reward balance outright (fixture operation)
    pub async fn fund_pool(
        &self,
        caller: Address,
        reward_token: Address,
        custodian: Address,
        amount: Amount,
    ) -> ContractResult<ExecutionResult> {
        let ((), result) = self
            .send(
                caller,
                reward_token,
                &RewardTokenCall::SetBalance {
                    holder: custodian,
                    amount,
                },
            )
            .await?;
        Ok(result)
    }

    /// Reward token balance of `holder`
    pub async fn reward_balance(
        &self,
        reward_token: Address,
        holder: Address,
    ) -> ContractResult<Amount> {
        self.call(holder, reward_token, &RewardTokenCall::BalanceOf { holder })
            .await
    }

    /// Transfer reward tokens from `from` to `to`
    pub async fn reward_transfer(
        &self,
        reward_token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> ContractResult<ExecutionResult> {
        let ((), result) = self
            .send(from, reward_token, &RewardTokenCall::Transfer { to, amount })
            .await?;
        Ok(result)
    }

    // --- Chain metadata ---

    /// Current state root
    pub async fn state_root(&self) -> Hash {
        self.state.read().await.state_root()
    }

    /// Number of sealed blocks
    pub async fn block_number(&self) -> u64 {
        self.state.read().await.block_number()
    }

    /// Last committed nonce of `account`
    pub async fn nonce(&self, account: Address) -> u64 {
        self.state.read().await.nonce(&account)
    }

    /// Copy of all receipts
    pub async fn receipts(&self) -> Vec<Receipt> {
        self.state.read().await.receipts().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fund_and_read_pool() {
        let client = ChainClient::new(ChainState::default());
        let admin = Address::dev_account(0);
        let custodian = Address::dev_account(3);

        tokio_test::block_on(async {
            let farm = client
                .deploy(
                    admin,
                    ContractSpec::RewardToken {
                        name: "FARM Reward Token".to_string(),
                        symbol: "FARM".to_string(),
                        initial_supply: Amount::ZERO,
                    },
                )
                .await
                .unwrap();

            client
                .fund_pool(admin, farm, custodian, Amount::from_raw(500))
                .await
                .unwrap();

            assert_eq!(
                client.reward_balance(farm, custodian).await.unwrap().raw(),
                500
            );
            assert_eq!(client.block_number().await, 2);
            assert_eq!(client.nonce(admin).await, 2);
            assert_eq!(
                client.token_metadata(farm).await.unwrap(),
                ("FARM Reward Token".to_string(), "FARM".to_string())
            );
        });
    }

    #[test]
    fn test_reward_transfer() {
        let client = ChainClient::new(ChainState::default());
        let admin = Address::dev_account(0);
        let to = Address::dev_account(4);

        tokio_test::block_on(async {
            let farm = client
                .deploy(
                    admin,
                    ContractSpec::RewardToken {
                        name: "FARM Reward Token".to_string(),
                        symbol: "FARM".to_string(),
                        initial_supply: Amount::from_raw(1_000),
                    },
                )
                .await
                .unwrap();

            client
                .reward_transfer(farm, admin, to, Amount::from_raw(400))
                .await
                .unwrap();
            assert_eq!(client.reward_balance(farm, admin).await.unwrap().raw(), 600);
            assert_eq!(client.reward_balance(farm, to).await.unwrap().raw(), 400);

            let err = client
                .reward_transfer(farm, to, admin, Amount::from_raw(401))
                .await
                .unwrap_err();
            assert!(err.is_insufficient_balance());
        });
    }
}
