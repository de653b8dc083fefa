pub mod account;
pub mod generate;
pub mod health;
pub mod topup;
