pub mod ai;
pub mod auth;
pub mod config;
pub mod credits;
pub mod logging;
pub mod models;
pub mod payment;
pub mod routes;
pub mod test_util;

pub use ai::{GeneratedContent, GeneratorClient};
pub use auth::{AuthUser, JwksClient};
pub use config::Config;
pub use credits::{
    perform_billable_operation, Billed, BillingError, ChargeOutcome, CreditEngine, LedgerError,
    LedgerStore,
};
pub use models::Account;
pub use payment::{MidtransClient, PaymentStatus};

use std::sync::Arc;

/// Shared application state.
///
/// Built once at startup; every request borrows the same clients instead of
/// re-initializing them.
pub struct AppState {
    pub config: Config,
    pub jwks_client: JwksClient,
    pub generator_client: Arc<GeneratorClient>,
    pub midtrans_client: MidtransClient,
    /// The ledger itself, for account bootstrap and top-up records.
    pub ledger: Arc<LedgerStore>,
    /// Charge/refund engine over the same ledger.
    pub credits: CreditEngine,
}
