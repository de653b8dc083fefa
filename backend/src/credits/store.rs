use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::account::Account;
use crate::models::topup::{PendingTopUp, TopUpState};

/// Outcome of a conditional balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The new balance was written.
    Committed(i64),
    /// The update closure declined; the balance is untouched.
    Aborted,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Conditional update contended for account {0}")]
    Contended(String),
}

/// How often a compare-and-swap write is retried before giving up.
const MAX_CAS_ATTEMPTS: u32 = 16;

/// SQLite-backed credit ledger.
///
/// One row per account. Balances are only ever written through
/// [`LedgerStore::conditional_update`], which re-reads the current value and
/// writes back with a compare-and-swap, so concurrent writers cannot lose
/// updates. Route handlers never touch the balance column directly.
pub struct LedgerStore {
    conn: Mutex<Connection>,
}

impl LedgerStore {
    pub fn new(database_url: &str) -> Result<Self, LedgerError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| LedgerError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                balance INTEGER NOT NULL,
                email TEXT,
                name TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS top_ups (
                order_id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                credits INTEGER NOT NULL,
                state TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (account_id) REFERENCES accounts(id)
            )",
            [],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_top_ups_account_id ON top_ups(account_id)",
            [],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        tracing::info!("Credit ledger initialized with database: {}", path);

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Create the account with its initial grant if no record exists.
    ///
    /// Existing accounts are returned untouched; the grant is never applied
    /// twice.
    pub fn create_account_if_absent(
        &self,
        account_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        initial_grant: i64,
    ) -> Result<Account, LedgerError> {
        let conn = self.conn.lock().map_err(|e| LedgerError::Database(e.to_string()))?;

        let now = Utc::now();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO accounts (id, balance, email, name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![account_id, initial_grant, email, name, now.to_rfc3339()],
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        if inserted == 1 {
            tracing::info!(
                "Created account {} with {} starter credits",
                account_id,
                initial_grant
            );
        }

        let account = conn
            .query_row(
                "SELECT id, balance, email, name, created_at FROM accounts WHERE id = ?1",
                params![account_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let (id, balance, email, name, created_at) = account;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);

        Ok(Account { id, email, name, balance, created_at })
    }

    /// Current balance, or `None` if the account does not exist.
    pub fn balance(&self, account_id: &str) -> Result<Option<i64>, LedgerError> {
        let conn = self.conn.lock().map_err(|e| LedgerError::Database(e.to_string()))?;

        conn.query_row(
            "SELECT balance FROM accounts WHERE id = ?1",
            params![account_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    /// Atomically rewrite the balance through `f`.
    ///
    /// `f` receives the current balance (`None` when no record exists) and
    /// returns the next balance, or `None` to abort and leave the record
    /// untouched. The write is a compare-and-swap against the value that was
    /// read; if another writer interleaved, the loop re-reads and applies `f`
    /// again. `f` must therefore be pure — no side effects.
    pub fn conditional_update<F>(
        &self,
        account_id: &str,
        mut f: F,
    ) -> Result<UpdateOutcome, LedgerError>
    where
        F: FnMut(Option<i64>) -> Option<i64>,
    {
        let conn = self.conn.lock().map_err(|e| LedgerError::Database(e.to_string()))?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let current: Option<i64> = conn
                .query_row(
                    "SELECT balance FROM accounts WHERE id = ?1",
                    params![account_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| LedgerError::Database(e.to_string()))?;

            let next = match f(current) {
                Some(next) => next,
                None => return Ok(UpdateOutcome::Aborted),
            };

            let written = match current {
                Some(previous) => conn
                    .execute(
                        "UPDATE accounts SET balance = ?1 WHERE id = ?2 AND balance = ?3",
                        params![next, account_id, previous],
                    )
                    .map_err(|e| LedgerError::Database(e.to_string()))?,
                None => conn
                    .execute(
                        "INSERT OR IGNORE INTO accounts (id, balance, created_at)
                         VALUES (?1, ?2, ?3)",
                        params![account_id, next, Utc::now().to_rfc3339()],
                    )
                    .map_err(|e| LedgerError::Database(e.to_string()))?,
            };

            if written == 1 {
                return Ok(UpdateOutcome::Committed(next));
            }
            // Another writer interleaved between our read and write; re-read.
        }

        Err(LedgerError::Contended(account_id.to_string()))
    }

    /// Record a freshly created gateway order as pending.
    pub fn begin_top_up(
        &self,
        order_id: &str,
        account_id: &str,
        credits: i64,
    ) -> Result<(), LedgerError> {
        let conn = self.conn.lock().map_err(|e| LedgerError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO top_ups (order_id, account_id, credits, state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                order_id,
                account_id,
                credits,
                TopUpState::Pending.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        tracing::debug!("Recorded pending top-up {} for {}", order_id, account_id);
        Ok(())
    }

    /// Look up a recorded top-up order.
    pub fn top_up(&self, order_id: &str) -> Result<Option<PendingTopUp>, LedgerError> {
        let conn = self.conn.lock().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::read_top_up(&conn, order_id)
    }

    /// Flip a pending order to applied, returning it exactly once.
    ///
    /// Returns `None` when the order is unknown or was already applied, so a
    /// duplicate confirmation can never credit the balance twice.
    pub fn settle_top_up(&self, order_id: &str) -> Result<Option<PendingTopUp>, LedgerError> {
        let conn = self.conn.lock().map_err(|e| LedgerError::Database(e.to_string()))?;

        let flipped = conn
            .execute(
                "UPDATE top_ups SET state = ?1 WHERE order_id = ?2 AND state = ?3",
                params![TopUpState::Applied.as_str(), order_id, TopUpState::Pending.as_str()],
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        if flipped != 1 {
            return Ok(None);
        }

        Self::read_top_up(&conn, order_id)
    }

    fn read_top_up(
        conn: &Connection,
        order_id: &str,
    ) -> Result<Option<PendingTopUp>, LedgerError> {
        let row = conn
            .query_row(
                "SELECT order_id, account_id, credits, state, created_at
                 FROM top_ups WHERE order_id = ?1",
                params![order_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(row.map(|(order_id, account_id, credits, state, created_at)| PendingTopUp {
            order_id,
            account_id,
            credits,
            state: TopUpState::parse(&state).unwrap_or(TopUpState::Pending),
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_none, assert_some};

    fn store() -> LedgerStore {
        LedgerStore::new(":memory:").unwrap()
    }

    #[test]
    fn test_create_account_applies_grant_once() {
        let store = store();
        let first = store
            .create_account_if_absent("u1", Some("a@b.c"), Some("Sari"), 10)
            .unwrap();
        assert_eq!(first.balance, 10);

        let again = store.create_account_if_absent("u1", None, None, 10).unwrap();
        assert_eq!(again.balance, 10);
        assert_eq!(again.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_balance_of_unknown_account() {
        let store = store();
        assert_none!(store.balance("ghost").unwrap());
    }

    #[test]
    fn test_conditional_update_commits() {
        let store = store();
        store.create_account_if_absent("u1", None, None, 10).unwrap();

        let outcome = store
            .conditional_update("u1", |current| current.map(|b| b - 2))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Committed(8));
        assert_eq!(store.balance("u1").unwrap(), Some(8));
    }

    #[test]
    fn test_conditional_update_abort_leaves_balance() {
        let store = store();
        store.create_account_if_absent("u1", None, None, 1).unwrap();

        let outcome = store.conditional_update("u1", |_| None).unwrap();
        assert_eq!(outcome, UpdateOutcome::Aborted);
        assert_eq!(store.balance("u1").unwrap(), Some(1));
    }

    #[test]
    fn test_conditional_update_creates_missing_record() {
        let store = store();
        let outcome = store
            .conditional_update("new", |current| Some(current.unwrap_or(0) + 25))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Committed(25));
        assert_eq!(store.balance("new").unwrap(), Some(25));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = std::sync::Arc::new(store());
        store.create_account_if_absent("u1", None, None, 0).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        store
                            .conditional_update("u1", |current| {
                                Some(current.unwrap_or(0) + 1)
                            })
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(store.balance("u1").unwrap(), Some(200));
    }

    #[test]
    fn test_top_up_settles_exactly_once() {
        let store = store();
        store.create_account_if_absent("u1", None, None, 0).unwrap();
        store.begin_top_up("KREDIT-UMKM-1", "u1", 25).unwrap();

        let pending = assert_some!(store.top_up("KREDIT-UMKM-1").unwrap());
        assert_eq!(pending.state, TopUpState::Pending);
        assert_eq!(pending.credits, 25);

        let settled = assert_some!(store.settle_top_up("KREDIT-UMKM-1").unwrap());
        assert_eq!(settled.state, TopUpState::Applied);
        assert_eq!(settled.account_id, "u1");

        // Duplicate confirmation is a no-op.
        assert_none!(store.settle_top_up("KREDIT-UMKM-1").unwrap());
    }

    #[test]
    fn test_settle_unknown_order() {
        let store = store();
        assert_none!(store.settle_top_up("KREDIT-NOPE-1").unwrap());
    }
}
