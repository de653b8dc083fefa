//! Credit ledger and billing.
//!
//! This module provides:
//! - The SQLite ledger with compare-and-swap balance updates
//! - The transaction engine that charges and refunds credits
//! - The billable-operation orchestrator (charge, run, refund on failure)

mod billing;
mod engine;
mod store;

pub use billing::{perform_billable_operation, Billed, BillingError};
pub use engine::{ChargeOutcome, CreditEngine};
pub use store::{LedgerError, LedgerStore, UpdateOutcome};
