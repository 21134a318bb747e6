//! Transfer Engine
//!
//! Executes one transfer as a single store transaction:
//!
//! ```text
//! BEGIN (READ COMMITTED)
//!   lock min(src, dst) FOR UPDATE ─┐ canonical order, independent of direction
//!   lock max(src, dst) FOR UPDATE ─┘
//!   src_pre < amount ?            → ROLLBACK, InsufficientFunds
//!   INSERT transfers (PENDING, pre-balances, correlation_id)
//!   UPDATE accounts src -= amount, dst += amount
//!   UPDATE transfers → COMPLETED (post-balances)
//! COMMIT
//! ```
//!
//! Any failure rolls the whole transaction back, including the audit insert.
//! Never retried automatically: a transfer is not idempotent.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::backend::{LedgerBackend, LedgerTx, PendingAudit};
use crate::correlation::CallContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{TransferRecord, TransferRequest, TransferResult, TransferStatus};

/// Row-lock order for a pair of accounts: lower id first.
///
/// Two transfers over the same pair, in either direction, lock in the same
/// global order, so no circular wait can form.
#[inline]
pub fn lock_order(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

pub struct TransferEngine {
    backend: Arc<dyn LedgerBackend>,
}

impl TransferEngine {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self { backend }
    }

    /// Atomically move `req.amount` from source to destination.
    pub async fn transfer(
        &self,
        ctx: &CallContext,
        req: &TransferRequest,
    ) -> LedgerResult<TransferResult> {
        // Re-checked here even though orchestration already validated
        req.validate()?;

        let result = ctx.run(self.execute(ctx, req)).await;
        match &result {
            Ok(r) => info!(
                correlation_id = ctx.correlation_value(),
                audit_id = r.audit_id,
                source_id = req.source_id,
                destination_id = req.destination_id,
                amount = %req.amount,
                "Transfer committed"
            ),
            Err(e) => warn!(
                correlation_id = ctx.correlation_value(),
                source_id = req.source_id,
                destination_id = req.destination_id,
                amount = %req.amount,
                code = e.code(),
                error = %e,
                "Transfer rolled back"
            ),
        }
        result
    }

    /// Read back one audit row.
    ///
    /// Not exposed over RPC; used by operator tooling and tests to check audit completeness.
    pub async fn get_transfer(&self, audit_id: i64) -> LedgerResult<Option<TransferRecord>> {
        self.backend.get_transfer(audit_id).await
    }

    async fn execute(
        &self,
        ctx: &CallContext,
        req: &TransferRequest,
    ) -> LedgerResult<TransferResult> {
        let mut tx = self.backend.begin().await?;

        match Self::apply(tx.as_mut(), ctx, req).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    // The connection drops the transaction anyway
                    warn!(error = %rb, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn apply(
        tx: &mut dyn LedgerTx,
        ctx: &CallContext,
        req: &TransferRequest,
    ) -> LedgerResult<TransferResult> {
        let (first, second) = lock_order(req.source_id, req.destination_id);

        let first_balance = tx
            .lock_balance(first)
            .await?
            .ok_or(LedgerError::AccountNotFound { account_id: first })?;
        let second_balance = tx
            .lock_balance(second)
            .await?
            .ok_or(LedgerError::AccountNotFound { account_id: second })?;

        let (src_pre, dst_pre) = if first == req.source_id {
            (first_balance, second_balance)
        } else {
            (second_balance, first_balance)
        };
        debug!(
            correlation_id = ctx.correlation_value(),
            %src_pre,
            %dst_pre,
            "Balances locked"
        );

        if src_pre < req.amount {
            return Err(LedgerError::InsufficientFunds {
                account_id: req.source_id,
                requested: req.amount,
            });
        }

        let stamp = tx
            .insert_pending(&PendingAudit {
                source_id: req.source_id,
                destination_id: req.destination_id,
                amount: req.amount,
                correlation_id: ctx.correlation_value(),
                source_prev_balance: src_pre,
                destination_prev_balance: dst_pre,
            })
            .await?;

        let (src_post, dst_post) = apply_amount(src_pre, dst_pre, req.amount)?;

        tx.set_balance(req.source_id, src_post).await?;
        tx.set_balance(req.destination_id, dst_post).await?;
        tx.complete_audit(stamp.audit_id, src_post, dst_post).await?;

        Ok(TransferResult {
            audit_id: stamp.audit_id,
            correlation_id: ctx.correlation_id(),
            status: TransferStatus::Completed,
            source_post_balance: src_post,
            destination_post_balance: dst_post,
            created_at: stamp.created_at,
        })
    }
}

/// Exact decimal debit/credit. The pair's sum is unchanged.
fn apply_amount(
    src_pre: Decimal,
    dst_pre: Decimal,
    amount: Decimal,
) -> LedgerResult<(Decimal, Decimal)> {
    let src_post = src_pre
        .checked_sub(amount)
        .ok_or_else(|| LedgerError::system("source balance underflow"))?;
    let dst_post = dst_pre
        .checked_add(amount)
        .ok_or_else(|| LedgerError::system("destination balance overflow"))?;
    Ok((src_post, dst_post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationId;
    use crate::ledger::memory::{FailPoint, MemoryLedgerBackend, Op};
    use std::str::FromStr;
    use std::time::Duration;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn setup(accounts: &[(i64, &str)]) -> (Arc<MemoryLedgerBackend>, TransferEngine) {
        let backend = Arc::new(MemoryLedgerBackend::with_accounts(accounts));
        let engine = TransferEngine::new(backend.clone());
        (backend, engine)
    }

    fn traced(id: i64) -> CallContext {
        CallContext::new(CorrelationId::new(id))
    }

    #[test]
    fn test_lock_order_is_direction_independent() {
        assert_eq!(lock_order(100, 200), (100, 200));
        assert_eq!(lock_order(200, 100), (100, 200));
    }

    #[tokio::test]
    async fn test_transfer_happy_path() {
        let (backend, engine) = setup(&[(100, "1000.00"), (200, "500.00")]);

        let result = engine
            .transfer(&traced(777), &TransferRequest::new(100, 200, d("50.00")))
            .await
            .unwrap();

        assert_eq!(result.status, TransferStatus::Completed);
        assert_eq!(result.source_post_balance, d("950.00"));
        assert_eq!(result.destination_post_balance, d("550.00"));
        assert_eq!(backend.balance(100), Some(d("950.00")));
        assert_eq!(backend.balance(200), Some(d("550.00")));

        let records = backend.transfers();
        assert_eq!(records.len(), 1);
        let audit = &records[0];
        assert_eq!(audit.audit_id, result.audit_id);
        assert_eq!(audit.status, TransferStatus::Completed);
        assert_eq!(audit.correlation_id, CorrelationId::new(777));
        assert_eq!(audit.source_prev_balance, d("1000.00"));
        assert_eq!(audit.destination_prev_balance, d("500.00"));
        assert_eq!(audit.source_post_balance, Some(d("950.00")));
        assert_eq!(audit.destination_post_balance, Some(d("550.00")));
    }

    #[tokio::test]
    async fn test_conservation() {
        let (backend, engine) = setup(&[(1, "123.45"), (2, "0.55")]);
        let before = backend.balance(1).unwrap() + backend.balance(2).unwrap();

        engine
            .transfer(&CallContext::background(), &TransferRequest::new(1, 2, d("23.45")))
            .await
            .unwrap();
        engine
            .transfer(&CallContext::background(), &TransferRequest::new(2, 1, d("0.01")))
            .await
            .unwrap();

        let after = backend.balance(1).unwrap() + backend.balance(2).unwrap();
        assert_eq!(before, after);
        assert_eq!(backend.balance(1), Some(d("100.01")));
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_no_trace() {
        let (backend, engine) = setup(&[(100, "40.00"), (200, "500.00")]);

        let err = engine
            .transfer(&traced(1), &TransferRequest::new(100, 200, d("50.00")))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account_id: 100,
                requested: d("50.00")
            }
        );
        assert_eq!(backend.balance(100), Some(d("40.00")));
        assert_eq!(backend.balance(200), Some(d("500.00")));
        assert!(backend.transfers().is_empty());
        assert_eq!(backend.ops().last(), Some(&Op::Rollback));
    }

    #[tokio::test]
    async fn test_exact_balance_can_be_drained() {
        let (backend, engine) = setup(&[(1, "50.00"), (2, "0")]);
        engine
            .transfer(&CallContext::background(), &TransferRequest::new(1, 2, d("50.00")))
            .await
            .unwrap();
        assert_eq!(backend.balance(1), Some(d("0.00")));
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let (backend, engine) = setup(&[(100, "10")]);

        let err = engine
            .transfer(&CallContext::background(), &TransferRequest::new(100, 300, d("1")))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound { account_id: 300 });

        let err = engine
            .transfer(&CallContext::background(), &TransferRequest::new(50, 100, d("1")))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound { account_id: 50 });
        assert_eq!(backend.balance(100), Some(d("10")));
    }

    #[tokio::test]
    async fn test_locks_taken_in_canonical_order_both_directions() {
        let (backend, engine) = setup(&[(100, "100"), (200, "100")]);

        engine
            .transfer(&CallContext::background(), &TransferRequest::new(200, 100, d("1")))
            .await
            .unwrap();
        engine
            .transfer(&CallContext::background(), &TransferRequest::new(100, 200, d("1")))
            .await
            .unwrap();

        let locks: Vec<i64> = backend
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Lock(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(locks, vec![100, 200, 100, 200]);
    }

    #[tokio::test]
    async fn test_same_account_rejected_before_begin() {
        let (backend, engine) = setup(&[(100, "100")]);

        let err = engine
            .transfer(&CallContext::background(), &TransferRequest::new(100, 100, d("10.00")))
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::SameAccount { account_id: 100 });
        assert_eq!(backend.begin_count(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_before_begin() {
        let (backend, engine) = setup(&[(1, "100"), (2, "100")]);

        let err = engine
            .transfer(&CallContext::background(), &TransferRequest::new(1, 2, Decimal::ZERO))
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::AmountMustBePositive);
        assert_eq!(backend.begin_count(), 0);
    }

    #[tokio::test]
    async fn test_every_step_failure_rolls_back_everything() {
        let points = [
            FailPoint::Begin,
            FailPoint::Lock,
            FailPoint::InsertPending,
            FailPoint::SetBalance,
            FailPoint::CompleteAudit,
            FailPoint::Commit,
        ];

        for point in points {
            let (backend, engine) = setup(&[(1, "100.00"), (2, "100.00")]);
            backend.fail_at(point);

            let err = engine
                .transfer(&CallContext::background(), &TransferRequest::new(1, 2, d("10")))
                .await
                .unwrap_err();

            assert!(
                matches!(err, LedgerError::SystemError(_)),
                "{:?} should surface SystemError, got {:?}",
                point,
                err
            );
            assert_eq!(backend.balance(1), Some(d("100.00")), "{:?}", point);
            assert_eq!(backend.balance(2), Some(d("100.00")), "{:?}", point);
            assert!(backend.transfers().is_empty(), "{:?}", point);
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_rolls_back() {
        let (backend, engine) = setup(&[(1, "100"), (2, "100")]);
        backend.set_lock_delay(Duration::from_millis(200));

        let ctx = CallContext::background().with_timeout(Duration::from_millis(20));
        let err = engine
            .transfer(&ctx, &TransferRequest::new(1, 2, d("10")))
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::system("deadline exceeded"));
        assert_eq!(backend.balance(1), Some(d("100")));
        assert!(backend.transfers().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_directions_do_not_deadlock() {
        let (backend, engine) = setup(&[(100, "1000.00"), (200, "1000.00")]);
        backend.set_lock_delay(Duration::from_millis(2));
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for i in 0..20 {
            let engine = engine.clone();
            let (src, dst) = if i % 2 == 0 { (100, 200) } else { (200, 100) };
            handles.push(tokio::spawn(async move {
                engine
                    .transfer(&CallContext::background(), &TransferRequest::new(src, dst, d("1.00")))
                    .await
            }));
        }

        let all = tokio::time::timeout(Duration::from_secs(10), futures::future::join_all(handles))
            .await
            .expect("transfers deadlocked");
        for r in all {
            r.unwrap().unwrap();
        }

        assert_eq!(backend.balance(100), Some(d("1000.00")));
        assert_eq!(backend.balance(200), Some(d("1000.00")));
        assert_eq!(backend.transfers().len(), 20);
    }

    #[tokio::test]
    async fn test_get_transfer_reads_committed_row() {
        let (_backend, engine) = setup(&[(1, "10"), (2, "0")]);
        let result = engine
            .transfer(&traced(5), &TransferRequest::new(1, 2, d("2.50")))
            .await
            .unwrap();

        let record = engine.get_transfer(result.audit_id).await.unwrap().unwrap();
        assert_eq!(record.amount, d("2.50"));
        assert_eq!(record.source_post_balance, Some(d("7.50")));
        assert!(engine.get_transfer(9_999).await.unwrap().is_none());
    }

    #[test]
    fn test_apply_amount_is_exact() {
        let (s, t) = apply_amount(d("0.30"), d("0.10"), d("0.10")).unwrap();
        assert_eq!(s, d("0.20"));
        assert_eq!(t, d("0.20"));
        assert_eq!(s + t, d("0.40"));
    }
}
