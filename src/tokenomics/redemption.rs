//! Pro-rata redemption math.
//!
//! No contract or storage dependencies, just arithmetic over the live pool
//! and the live participation supply.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::types::Amount;

/// Reward payout for burning `amount` participation units.
///
/// `payout = floor(amount * pool / supply)`. The product is taken in 256
/// bits, so any payout that fits in `u128` is returned; with
/// `amount <= supply` that is always the case.
///
/// # Returns
/// * `Some(ZERO)` when `supply` or `amount` is zero
/// * `None` when the quotient does not fit in `u128`
#[must_use]
pub fn redemption_payout(amount: Amount, pool: Amount, supply: Amount) -> Option<Amount> {
    if supply.is_zero() || amount.is_zero() {
        return Some(Amount::ZERO);
    }

    let payout = U256::from(amount.raw())
        .checked_mul(U256::from(pool.raw()))?
        .checked_div(U256::from(supply.raw()))?;
    if payout > U256::from(u128::MAX) {
        return None;
    }
    Some(Amount::from_raw(payout.low_u128()))
}

/// Preview of a redemption against the current pool and supply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionQuote {
    /// Participation units burned
    pub amount: Amount,
    /// Reward tokens paid out
    pub payout: Amount,
    /// Pool balance left with the authority
    pub pool_after: Amount,
    /// Participation supply after the burn
    pub supply_after: Amount,
}

impl RedemptionQuote {
    /// Quote a redemption of `amount` units
    ///
    /// Returns `None` on overflow or when `amount` exceeds `supply`.
    #[must_use]
    pub fn new(amount: Amount, pool: Amount, supply: Amount) -> Option<Self> {
        let payout = redemption_payout(amount, pool, supply)?;
        Some(Self {
            amount,
            payout,
            pool_after: pool.checked_sub(payout)?,
            supply_after: supply.checked_sub(amount)?,
        })
    }
}
