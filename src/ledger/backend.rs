//! Storage seam for the transfer engine.
//!
//! A [`LedgerTx`] is one open store transaction. Dropping it without
//! `commit` must roll back, the same way a dropped `sqlx::Transaction` does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::LedgerResult;
use crate::models::TransferRecord;

/// Audit row fields known before any balance is mutated
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAudit {
    pub source_id: i64,
    pub destination_id: i64,
    pub amount: Decimal,
    /// 0 when untraced
    pub correlation_id: i64,
    pub source_prev_balance: Decimal,
    pub destination_prev_balance: Decimal,
}

/// Store-assigned identity of an inserted audit row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditStamp {
    pub audit_id: i64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Open a READ COMMITTED transaction
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTx>>;

    async fn get_transfer(&self, audit_id: i64) -> LedgerResult<Option<TransferRecord>>;
}

#[async_trait]
pub trait LedgerTx: Send {
    /// Take an exclusive row lock and read the balance. `None` if the row is missing.
    async fn lock_balance(&mut self, account_id: i64) -> LedgerResult<Option<Decimal>>;

    async fn insert_pending(&mut self, entry: &PendingAudit) -> LedgerResult<AuditStamp>;

    async fn set_balance(&mut self, account_id: i64, balance: Decimal) -> LedgerResult<()>;

    /// Flip a Pending row to Completed with post-balances
    async fn complete_audit(
        &mut self,
        audit_id: i64,
        source_post_balance: Decimal,
        destination_post_balance: Decimal,
    ) -> LedgerResult<()>;

    async fn commit(self: Box<Self>) -> LedgerResult<()>;

    async fn rollback(self: Box<Self>) -> LedgerResult<()>;
}
