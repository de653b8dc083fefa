use chrono::{DateTime, Utc};
use serde::Serialize;

/// Ledger account, created on first authentication.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    /// Subject identifier from the identity provider.
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Credit balance. Never negative at rest.
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}
