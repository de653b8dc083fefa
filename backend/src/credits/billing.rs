use std::future::Future;

use super::engine::{ChargeOutcome, CreditEngine};
use super::store::LedgerError;

/// Why a billable operation produced no paid result.
#[derive(Debug, thiserror::Error)]
pub enum BillingError<E> {
    /// Balance below cost. The paid collaborator was never invoked.
    #[error("insufficient credits")]
    InsufficientCredits,
    /// The ledger itself failed. The paid collaborator was never invoked.
    #[error("credit ledger unavailable: {0}")]
    LedgerUnavailable(LedgerError),
    /// The paid operation failed after a successful charge. The charge has
    /// been refunded, or the failed refund logged for reconciliation.
    #[error("paid operation failed: {0}")]
    Operation(E),
    /// The paid operation was torn down without producing a result; the
    /// charge has been compensated.
    #[error("paid operation aborted")]
    Aborted,
}

/// A paid result together with the balance left after the charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Billed<T> {
    pub value: T,
    pub new_balance: i64,
}

/// Charge first, then run the paid operation, refunding the charge if the
/// operation fails.
///
/// This is the only code path allowed to both charge credits and invoke a
/// paid collaborator. The operation and its compensation run on a detached
/// task, so a client disconnect mid-generation cannot strand the charge.
pub async fn perform_billable_operation<F, Fut, T, E>(
    engine: &CreditEngine,
    account_id: &str,
    cost: i64,
    operation: F,
) -> Result<Billed<T>, BillingError<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let new_balance = match engine.charge(account_id, cost) {
        Ok(ChargeOutcome::Committed(balance)) => balance,
        Ok(ChargeOutcome::InsufficientFunds) => {
            return Err(BillingError::InsufficientCredits);
        }
        Err(e) => {
            tracing::error!("Charge failed for {}: {}", account_id, e);
            return Err(BillingError::LedgerUnavailable(e));
        }
    };

    let settle_engine = engine.clone();
    let settle_account = account_id.to_string();
    let fut = operation();
    let task = tokio::spawn(async move {
        match fut.await {
            Ok(value) => Ok(value),
            Err(err) => {
                refund_after_failure(&settle_engine, &settle_account, cost);
                Err(err)
            }
        }
    });

    match task.await {
        Ok(Ok(value)) => Ok(Billed { value, new_balance }),
        Ok(Err(err)) => Err(BillingError::Operation(err)),
        Err(join_err) => {
            // The task unwound before reaching its own compensation path.
            refund_after_failure(engine, account_id, cost);
            tracing::error!(
                "Billable operation for {} did not complete: {}",
                account_id,
                join_err
            );
            Err(BillingError::Aborted)
        }
    }
}

fn refund_after_failure(engine: &CreditEngine, account_id: &str, cost: i64) {
    match engine.refund(account_id, cost) {
        Ok(balance) => tracing::info!(
            "Refunded {} credits to {} after failed paid operation, balance {}",
            cost,
            account_id,
            balance
        ),
        Err(err) => tracing::error!(
            "REFUND FAILED for {} ({} credits) after paid-operation failure, \
             manual reconciliation required: {}",
            account_id,
            cost,
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credits::store::LedgerStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn engine_with_balance(balance: i64) -> CreditEngine {
        let store = Arc::new(LedgerStore::new(":memory:").unwrap());
        store.create_account_if_absent("u1", None, None, balance).unwrap();
        CreditEngine::new(store)
    }

    #[tokio::test]
    async fn test_success_keeps_charge() {
        let engine = engine_with_balance(10);

        let billed =
            perform_billable_operation(&engine, "u1", 2, || async { Ok::<_, String>("flyer") })
                .await
                .unwrap();

        assert_eq!(billed.value, "flyer");
        assert_eq!(billed.new_balance, 8);
        assert_eq!(engine.balance("u1").unwrap(), Some(8));
    }

    #[tokio::test]
    async fn test_insufficient_credits_never_runs_operation() {
        let engine = engine_with_balance(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let spy = calls.clone();

        let result = perform_billable_operation(&engine, "u1", 2, move || async move {
            spy.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>("flyer")
        })
        .await;

        assert!(matches!(result, Err(BillingError::InsufficientCredits)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.balance("u1").unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_operation_failure_refunds_once() {
        let engine = engine_with_balance(10);

        let result = perform_billable_operation(&engine, "u1", 2, || async {
            Err::<&str, _>("upstream timed out".to_string())
        })
        .await;

        assert!(matches!(result, Err(BillingError::Operation(_))));
        // Exactly one refund: a double refund would leave 12.
        assert_eq!(engine.balance("u1").unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_operation_runs_after_charge_commits() {
        let engine = engine_with_balance(10);
        let seen = Arc::new(std::sync::Mutex::new(None));
        let spy = seen.clone();
        let probe = engine.clone();

        perform_billable_operation(&engine, "u1", 2, move || async move {
            *spy.lock().unwrap() = probe.balance("u1").unwrap();
            Ok::<_, String>(())
        })
        .await
        .unwrap();

        // The operation observed the post-charge balance.
        assert_eq!(*seen.lock().unwrap(), Some(8));
    }
}
