//! PostgreSQL ledger store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Transaction};

use super::backend::{AuditStamp, LedgerBackend, LedgerTx, PendingAudit};
use crate::correlation::CorrelationId;
use crate::db::SafeRow;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{TransferRecord, TransferStatus};

pub struct PgLedgerBackend {
    pool: PgPool,
}

impl PgLedgerBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerBackend for PgLedgerBackend {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTx>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn get_transfer(&self, audit_id: i64) -> LedgerResult<Option<TransferRecord>> {
        let row = sqlx::query(
            r#"
            SELECT transfer_id, correlation_id, source_account_id, destination_account_id,
                   amount, status, source_prev_balance, destination_prev_balance,
                   source_post_balance, destination_post_balance, created_at
            FROM transfers
            WHERE transfer_id = $1
            "#,
        )
        .bind(audit_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_record(&r)).transpose()
    }
}

fn row_to_record(row: &PgRow) -> LedgerResult<TransferRecord> {
    let missing = |col: &str| LedgerError::system(format!("transfers.{} unreadable", col));

    let status_id: i16 = row.try_get_log("status").ok_or_else(|| missing("status"))?;
    let status = TransferStatus::from_id(status_id)
        .ok_or_else(|| LedgerError::system(format!("unknown transfer status {}", status_id)))?;
    let correlation: i64 = row.try_get_log("correlation_id").unwrap_or(0); // SAFE_DEFAULT: untraced

    Ok(TransferRecord {
        audit_id: row.try_get_log("transfer_id").ok_or_else(|| missing("transfer_id"))?,
        correlation_id: CorrelationId::new(correlation),
        source_id: row
            .try_get_log("source_account_id")
            .ok_or_else(|| missing("source_account_id"))?,
        destination_id: row
            .try_get_log("destination_account_id")
            .ok_or_else(|| missing("destination_account_id"))?,
        amount: row.try_get_log("amount").ok_or_else(|| missing("amount"))?,
        status,
        source_prev_balance: row
            .try_get_log("source_prev_balance")
            .ok_or_else(|| missing("source_prev_balance"))?,
        destination_prev_balance: row
            .try_get_log("destination_prev_balance")
            .ok_or_else(|| missing("destination_prev_balance"))?,
        source_post_balance: row.try_get_log::<Option<Decimal>>("source_post_balance").flatten(),
        destination_post_balance: row
            .try_get_log::<Option<Decimal>>("destination_post_balance")
            .flatten(),
        created_at: row
            .try_get_log::<DateTime<Utc>>("created_at")
            .ok_or_else(|| missing("created_at"))?,
    })
}

struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_balance(&mut self, account_id: i64) -> LedgerResult<Option<Decimal>> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE account_id = $1 FOR UPDATE")
                .bind(account_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(balance)
    }

    async fn insert_pending(&mut self, entry: &PendingAudit) -> LedgerResult<AuditStamp> {
        let (audit_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO transfers (
                source_account_id, destination_account_id, amount, correlation_id, status,
                source_prev_balance, destination_prev_balance
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING transfer_id, created_at
            "#,
        )
        .bind(entry.source_id)
        .bind(entry.destination_id)
        .bind(entry.amount)
        .bind(entry.correlation_id)
        .bind(TransferStatus::Pending.id())
        .bind(entry.source_prev_balance)
        .bind(entry.destination_prev_balance)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(AuditStamp {
            audit_id,
            created_at,
        })
    }

    async fn set_balance(&mut self, account_id: i64, balance: Decimal) -> LedgerResult<()> {
        let result = sqlx::query("UPDATE accounts SET balance = $1 WHERE account_id = $2")
            .bind(balance)
            .bind(account_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() != 1 {
            return Err(LedgerError::system(format!(
                "balance update touched {} rows for account {}",
                result.rows_affected(),
                account_id
            )));
        }
        Ok(())
    }

    async fn complete_audit(
        &mut self,
        audit_id: i64,
        source_post_balance: Decimal,
        destination_post_balance: Decimal,
    ) -> LedgerResult<()> {
        // CAS: only a Pending row may complete
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = $1, source_post_balance = $2, destination_post_balance = $3
            WHERE transfer_id = $4 AND status = $5
            "#,
        )
        .bind(TransferStatus::Completed.id())
        .bind(source_post_balance)
        .bind(destination_post_balance)
        .bind(audit_id)
        .bind(TransferStatus::Pending.id())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(LedgerError::system(format!("audit {} not pending", audit_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> LedgerResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
