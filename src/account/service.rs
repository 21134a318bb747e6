//! Account Service
//!
//! Creation with optimistic cache pre-check and write-through, lookups with
//! read-repair, and the startup cache warm-up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::repository::AccountRepository;
use crate::cache::AccountCache;
use crate::correlation::CallContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Account;
use crate::retry::{RetryPolicy, with_backoff};

pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
    cache: Arc<dyn AccountCache>,
    retry: RetryPolicy,
}

impl AccountService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        cache: Arc<dyn AccountCache>,
        retry: RetryPolicy,
    ) -> Self {
        Self { repo, cache, retry }
    }

    pub async fn create_account(&self, ctx: &CallContext, account: &Account) -> LedgerResult<()> {
        account.validate()?;

        // Optimistic: the unique key is the real guard
        match ctx.run(self.cache.exists(account.id)).await {
            Ok(true) => {
                return Err(LedgerError::AccountAlreadyExists {
                    account_id: account.id,
                });
            }
            Ok(false) => {}
            Err(e) => warn!(
                correlation_id = ctx.correlation_value(),
                account_id = account.id,
                error = %e,
                "Cache pre-check failed, continuing with insert"
            ),
        }

        ctx.run(self.repo.create_account(account)).await?;
        info!(
            correlation_id = ctx.correlation_value(),
            account_id = account.id,
            balance = %account.balance,
            "Account created"
        );

        self.write_through(ctx, account).await;
        Ok(())
    }

    /// Store read, then best-effort read-repair of the cache entry.
    ///
    /// Not exposed over RPC; an entry point for operator tooling and tests.
    pub async fn get_account(&self, ctx: &CallContext, account_id: i64) -> LedgerResult<Account> {
        let account = ctx
            .run(with_backoff(self.retry, "get_account", move || {
                self.repo.get_account(account_id)
            }))
            .await?;

        self.write_through(ctx, &account).await;
        Ok(account)
    }

    /// Load every account into the cache. Returns how many entries were written.
    ///
    /// A store failure aborts; a per-entry cache failure is logged and skipped.
    pub async fn warm_up_cache(&self) -> LedgerResult<usize> {
        let accounts = with_backoff(self.retry, "load_accounts", move || self.repo.get_all()).await?;

        let mut cached = 0;
        for account in &accounts {
            match self.cache.set_account(account).await {
                Ok(()) => cached += 1,
                Err(e) => warn!(
                    account_id = account.id,
                    error = %e,
                    "Failed to warm cache entry"
                ),
            }
        }

        info!(total = accounts.len(), cached, "Account cache warmed");
        Ok(cached)
    }

    async fn write_through(&self, ctx: &CallContext, account: &Account) {
        match ctx.run(self.cache.set_account(account)).await {
            Ok(()) => debug!(account_id = account.id, "Cache updated"),
            Err(e) => warn!(
                correlation_id = ctx.correlation_value(),
                account_id = account.id,
                error = %e,
                "Cache write failed"
            ),
        }
    }
}
