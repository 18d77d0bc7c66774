//! Token economics: how participation converts into reward share.

pub mod redemption;

pub use redemption::{redemption_payout, RedemptionQuote};
