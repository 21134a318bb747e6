//! Transfer orchestration
//!
//! ```text
//! validate ─▶ same account? ─▶ cache.exists(src) ─▶ cache.exists(dst) ─▶ engine
//!    400          400             404 on miss          404 on miss
//! ```
//!
//! The cache only gates: a cached balance is never used for the funds check,
//! and an account missing from the store is still caught under lock.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::AccountCache;
use crate::correlation::CallContext;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::TransferEngine;
use crate::models::{TransferRequest, TransferResult};
use crate::retry::{RetryPolicy, with_backoff};

pub struct TransferService {
    engine: TransferEngine,
    cache: Arc<dyn AccountCache>,
    retry: RetryPolicy,
}

impl TransferService {
    pub fn new(engine: TransferEngine, cache: Arc<dyn AccountCache>, retry: RetryPolicy) -> Self {
        Self {
            engine,
            cache,
            retry,
        }
    }

    pub async fn make_transfer(
        &self,
        ctx: &CallContext,
        req: &TransferRequest,
    ) -> LedgerResult<TransferResult> {
        // Same-account and shape checks, before any I/O
        req.validate()?;

        for account_id in [req.source_id, req.destination_id] {
            self.ensure_known(ctx, account_id).await?;
        }

        self.engine.transfer(ctx, req).await
    }

    /// A cache read error is surfaced; it never counts as "absent".
    async fn ensure_known(&self, ctx: &CallContext, account_id: i64) -> LedgerResult<()> {
        let cache = &self.cache;
        let known = ctx
            .run(with_backoff(self.retry, "cache_exists", move || {
                cache.exists(account_id)
            }))
            .await
            .inspect_err(|e| {
                warn!(
                    correlation_id = ctx.correlation_value(),
                    account_id,
                    error = %e,
                    "Cache existence check failed"
                )
            })?;

        if !known {
            debug!(
                correlation_id = ctx.correlation_value(),
                account_id, "Account unknown to cache"
            );
            return Err(LedgerError::AccountNotFound { account_id });
        }
        Ok(())
    }
}
