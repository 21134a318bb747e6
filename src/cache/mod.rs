//! Account Existence Cache
//!
//! Best-effort index of which account ids exist, plus a denormalized balance
//! snapshot. Never authoritative: the ledger store decides. Entries have no
//! TTL and are only replaced by a later write (create, read-repair, warm-up).
//!
//! Failure policy lives with the callers:
//! - write failures are logged and swallowed
//! - read failures on the transfer path are surfaced, never read as "absent"

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::error::LedgerResult;
use crate::models::Account;

/// Cache key for an account entry
pub fn account_key(account_id: i64) -> String {
    format!("account:{}", account_id)
}

#[async_trait]
pub trait AccountCache: Send + Sync {
    /// Whether the account is known to exist
    async fn exists(&self, account_id: i64) -> LedgerResult<bool>;

    /// Idempotent last-write-wins upsert
    async fn set_account(&self, account: &Account) -> LedgerResult<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedAccount {
    pub balance: Decimal,
    pub cached_at: DateTime<Utc>,
}

/// In-process cache backed by a concurrent hash map
#[derive(Default)]
pub struct MemoryAccountCache {
    entries: DashMap<String, CachedAccount>,
}

impl MemoryAccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last-known balance, for diagnostics only. The transfer path never reads this.
    pub fn balance_snapshot(&self, account_id: i64) -> Option<Decimal> {
        self.entries
            .get(&account_key(account_id))
            .map(|e| e.balance)
    }
}

#[async_trait]
impl AccountCache for MemoryAccountCache {
    async fn exists(&self, account_id: i64) -> LedgerResult<bool> {
        Ok(self.entries.contains_key(&account_key(account_id)))
    }

    async fn set_account(&self, account: &Account) -> LedgerResult<()> {
        self.entries.insert(
            account_key(account.id),
            CachedAccount {
                balance: account.balance,
                cached_at: Utc::now(),
            },
        );
        Ok(())
    }
}


#[cfg(test)]
pub use mock::MockCache;
