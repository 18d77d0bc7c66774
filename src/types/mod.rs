//! Core value types shared by the contract runtime.

mod address;
mod amount;

pub use address::{Address, AddressError};
pub use amount::Amount;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Current wall-clock time in milliseconds
#[must_use]
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}
