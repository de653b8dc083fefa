use std::sync::Arc;

use super::store::{LedgerError, LedgerStore, UpdateOutcome};

/// Result of a charge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// The cost was deducted; carries the post-charge balance.
    Committed(i64),
    /// No account, or the balance does not cover the cost. Nothing written.
    InsufficientFunds,
}

/// Applies charges and compensating credits to the ledger.
///
/// The authoritative sufficiency check lives inside the conditional update;
/// a pre-flight balance read is only ever display data.
#[derive(Clone)]
pub struct CreditEngine {
    store: Arc<LedgerStore>,
}

impl CreditEngine {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Deduct `cost` credits if and only if the current balance covers it.
    pub fn charge(&self, account_id: &str, cost: i64) -> Result<ChargeOutcome, LedgerError> {
        let outcome = self.store.conditional_update(account_id, |current| match current {
            Some(balance) if balance >= cost => Some(balance - cost),
            _ => None,
        })?;

        Ok(match outcome {
            UpdateOutcome::Committed(balance) => ChargeOutcome::Committed(balance),
            UpdateOutcome::Aborted => ChargeOutcome::InsufficientFunds,
        })
    }

    /// Credit `amount` back unconditionally.
    ///
    /// Compensation for a charge whose paid operation failed, and the same
    /// primitive that applies a settled top-up.
    pub fn refund(&self, account_id: &str, amount: i64) -> Result<i64, LedgerError> {
        match self
            .store
            .conditional_update(account_id, |current| Some(current.unwrap_or(0) + amount))?
        {
            UpdateOutcome::Committed(balance) => Ok(balance),
            // The closure above never aborts.
            UpdateOutcome::Aborted => {
                Err(LedgerError::Database("unconditional update aborted".to_string()))
            }
        }
    }

    /// Current balance for display; `None` if the account does not exist.
    pub fn balance(&self, account_id: &str) -> Result<Option<i64>, LedgerError> {
        self.store.balance(account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn engine_with_balance(balance: i64) -> CreditEngine {
        let store = Arc::new(LedgerStore::new(":memory:").unwrap());
        store.create_account_if_absent("u1", None, None, balance).unwrap();
        CreditEngine::new(store)
    }

    #[test]
    fn test_charge_deducts_when_covered() {
        let engine = engine_with_balance(10);
        let outcome = engine.charge("u1", 2).unwrap();
        assert_eq!(outcome, ChargeOutcome::Committed(8));
        assert_eq!(engine.balance("u1").unwrap(), Some(8));
    }

    #[rstest]
    #[case(1, 2)]
    #[case(0, 2)]
    #[case(0, 1)]
    fn test_charge_insufficient_leaves_balance(#[case] balance: i64, #[case] cost: i64) {
        let engine = engine_with_balance(balance);
        let outcome = engine.charge("u1", cost).unwrap();
        assert_eq!(outcome, ChargeOutcome::InsufficientFunds);
        assert_eq!(engine.balance("u1").unwrap(), Some(balance));
    }

    #[test]
    fn test_charge_missing_account_is_insufficient() {
        let engine = engine_with_balance(10);
        let outcome = engine.charge("ghost", 2).unwrap();
        assert_eq!(outcome, ChargeOutcome::InsufficientFunds);
        assert_eq!(engine.balance("ghost").unwrap(), None);
    }

    #[test]
    fn test_charge_exact_balance_drains_to_zero() {
        let engine = engine_with_balance(2);
        let outcome = engine.charge("u1", 2).unwrap();
        assert_eq!(outcome, ChargeOutcome::Committed(0));
    }

    #[test]
    fn test_refund_restores_charge() {
        let engine = engine_with_balance(10);
        engine.charge("u1", 2).unwrap();
        let balance = engine.refund("u1", 2).unwrap();
        assert_eq!(balance, 10);
    }

    #[test]
    fn test_refund_creates_missing_account() {
        let engine = engine_with_balance(0);
        let balance = engine.refund("fresh", 25).unwrap();
        assert_eq!(balance, 25);
        assert_eq!(engine.balance("fresh").unwrap(), Some(25));
    }
}
