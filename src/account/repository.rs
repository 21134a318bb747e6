//! Repository layer for account rows

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::db::SafeRow;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Account;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. A duplicate id is `AccountAlreadyExists`.
    async fn create_account(&self, account: &Account) -> LedgerResult<()>;

    async fn get_account(&self, account_id: i64) -> LedgerResult<Account>;

    /// Full scan, used for cache warm-up
    async fn get_all(&self) -> LedgerResult<Vec<Account>>;
}

pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(account_id: i64, e: sqlx::Error) -> LedgerError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            LedgerError::AccountAlreadyExists { account_id }
        }
        _ => LedgerError::from(e),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create_account(&self, account: &Account) -> LedgerResult<()> {
        sqlx::query("INSERT INTO accounts (account_id, balance) VALUES ($1, $2)")
            .bind(account.id)
            .bind(account.balance)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(account.id, e))?;
        Ok(())
    }

    async fn get_account(&self, account_id: i64) -> LedgerResult<Account> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;

        balance
            .map(|b| Account::new(account_id, b))
            .ok_or(LedgerError::AccountNotFound { account_id })
    }

    async fn get_all(&self) -> LedgerResult<Vec<Account>> {
        let rows = sqlx::query("SELECT account_id, balance FROM accounts ORDER BY account_id")
            .fetch_all(&self.pool)
            .await?;

        // Unreadable rows are logged by try_get_log and skipped
        let accounts: Vec<Account> = rows
            .iter()
            .filter_map(|row| {
                let id: i64 = row.try_get_log("account_id")?;
                let balance: Decimal = row.try_get_log("balance")?;
                Some(Account::new(id, balance))
            })
            .collect();

        tracing::info!("Loaded {} accounts from DB", accounts.len());
        Ok(accounts)
    }
}


#[cfg(test)]
pub use mock::MockAccountRepository;
