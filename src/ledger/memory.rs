//! In-memory ledger store for unit tests.
//!
//! Emulates the parts of PostgreSQL the engine relies on: per-row exclusive
//! locks held until commit/rollback, writes invisible until commit, and a
//! store-assigned audit id. Every call is recorded so tests can assert on
//! lock order, and any step can be scripted to fail.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::backend::{AuditStamp, LedgerBackend, LedgerTx, PendingAudit};
use crate::correlation::CorrelationId;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{TransferRecord, TransferStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    Lock,
    InsertPending,
    SetBalance,
    CompleteAudit,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Begin,
    Lock(i64),
    InsertPending,
    SetBalance(i64),
    CompleteAudit(i64),
    Commit,
    Rollback,
}

struct Shared {
    row_locks: HashMap<i64, Arc<RowLock<()>>>,
    balances: Mutex<HashMap<i64, Decimal>>,
    transfers: Mutex<Vec<TransferRecord>>,
    next_audit_id: AtomicI64,
    ops: Mutex<Vec<Op>>,
    fail_at: Mutex<Option<FailPoint>>,
    lock_delay: Mutex<Duration>,
    begins: AtomicUsize,
}

impl Shared {
    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }

    fn check(&self, point: FailPoint) -> LedgerResult<()> {
        if *self.fail_at.lock().unwrap() == Some(point) {
            return Err(LedgerError::system(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

pub struct MemoryLedgerBackend {
    shared: Arc<Shared>,
}

impl MemoryLedgerBackend {
    pub fn with_accounts(accounts: &[(i64, &str)]) -> Self {
        let balances: HashMap<i64, Decimal> = accounts
            .iter()
            .map(|(id, b)| (*id, Decimal::from_str(b).unwrap()))
            .collect();
        let row_locks = balances
            .keys()
            .map(|id| (*id, Arc::new(RowLock::new(()))))
            .collect();

        Self {
            shared: Arc::new(Shared {
                row_locks,
                balances: Mutex::new(balances),
                transfers: Mutex::new(Vec::new()),
                next_audit_id: AtomicI64::new(1),
                ops: Mutex::new(Vec::new()),
                fail_at: Mutex::new(None),
                lock_delay: Mutex::new(Duration::ZERO),
                begins: AtomicUsize::new(0),
            }),
        }
    }

    pub fn fail_at(&self, point: FailPoint) {
        *self.shared.fail_at.lock().unwrap() = Some(point);
    }

    /// Sleep before each row lock, to widen race windows
    pub fn set_lock_delay(&self, delay: Duration) {
        *self.shared.lock_delay.lock().unwrap() = delay;
    }

    /// Committed balance
    pub fn balance(&self, account_id: i64) -> Option<Decimal> {
        self.shared.balances.lock().unwrap().get(&account_id).copied()
    }

    /// Committed audit rows
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.shared.transfers.lock().unwrap().clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.shared.ops.lock().unwrap().clone()
    }

    pub fn begin_count(&self) -> usize {
        self.shared.begins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerBackend for MemoryLedgerBackend {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTx>> {
        self.shared.begins.fetch_add(1, Ordering::SeqCst);
        self.shared.check(FailPoint::Begin)?;
        self.shared.record(Op::Begin);
        Ok(Box::new(MemoryLedgerTx {
            shared: self.shared.clone(),
            guards: Vec::new(),
            staged_balances: HashMap::new(),
            staged_audits: Vec::new(),
        }))
    }

    async fn get_transfer(&self, audit_id: i64) -> LedgerResult<Option<TransferRecord>> {
        Ok(self
            .shared
            .transfers
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.audit_id == audit_id)
            .cloned())
    }
}

struct MemoryLedgerTx {
    shared: Arc<Shared>,
    guards: Vec<OwnedMutexGuard<()>>,
    staged_balances: HashMap<i64, Decimal>,
    staged_audits: Vec<TransferRecord>,
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_balance(&mut self, account_id: i64) -> LedgerResult<Option<Decimal>> {
        self.shared.check(FailPoint::Lock)?;
        self.shared.record(Op::Lock(account_id));

        let delay = *self.shared.lock_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let Some(lock) = self.shared.row_locks.get(&account_id).cloned() else {
            return Ok(None);
        };
        self.guards.push(lock.lock_owned().await);

        let balance = match self.staged_balances.get(&account_id) {
            Some(b) => Some(*b),
            None => self.shared.balances.lock().unwrap().get(&account_id).copied(),
        };
        Ok(balance)
    }

    async fn insert_pending(&mut self, entry: &PendingAudit) -> LedgerResult<AuditStamp> {
        self.shared.check(FailPoint::InsertPending)?;
        self.shared.record(Op::InsertPending);

        let stamp = AuditStamp {
            audit_id: self.shared.next_audit_id.fetch_add(1, Ordering::SeqCst),
            created_at: Utc::now(),
        };
        self.staged_audits.push(TransferRecord {
            audit_id: stamp.audit_id,
            correlation_id: CorrelationId::new(entry.correlation_id),
            source_id: entry.source_id,
            destination_id: entry.destination_id,
            amount: entry.amount,
            status: TransferStatus::Pending,
            source_prev_balance: entry.source_prev_balance,
            destination_prev_balance: entry.destination_prev_balance,
            source_post_balance: None,
            destination_post_balance: None,
            created_at: stamp.created_at,
        });
        Ok(stamp)
    }

    async fn set_balance(&mut self, account_id: i64, balance: Decimal) -> LedgerResult<()> {
        self.shared.check(FailPoint::SetBalance)?;
        self.shared.record(Op::SetBalance(account_id));
        if balance < Decimal::ZERO {
            return Err(LedgerError::system("balance check constraint violated"));
        }
        self.staged_balances.insert(account_id, balance);
        Ok(())
    }

    async fn complete_audit(
        &mut self,
        audit_id: i64,
        source_post_balance: Decimal,
        destination_post_balance: Decimal,
    ) -> LedgerResult<()> {
        self.shared.check(FailPoint::CompleteAudit)?;
        self.shared.record(Op::CompleteAudit(audit_id));

        let row = self
            .staged_audits
            .iter_mut()
            .find(|r| r.audit_id == audit_id && r.status == TransferStatus::Pending)
            .ok_or_else(|| LedgerError::system(format!("audit {} not pending", audit_id)))?;
        row.status = TransferStatus::Completed;
        row.source_post_balance = Some(source_post_balance);
        row.destination_post_balance = Some(destination_post_balance);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        if let Err(e) = self.shared.check(FailPoint::Commit) {
            self.shared.record(Op::Rollback);
            return Err(e);
        }

        let this = *self;
        this.shared
            .balances
            .lock()
            .unwrap()
            .extend(this.staged_balances);
        this.shared
            .transfers
            .lock()
            .unwrap()
            .extend(this.staged_audits);
        this.shared.record(Op::Commit);
        drop(this.guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LedgerResult<()> {
        self.shared.record(Op::Rollback);
        Ok(())
    }
}
