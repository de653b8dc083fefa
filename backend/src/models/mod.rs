pub mod account;
pub mod topup;

pub use account::Account;
pub use topup::{PendingTopUp, TopUpState};
