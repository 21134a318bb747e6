//! Core-side RPC handlers.
//!
//! Parses wire strings into domain values, builds the per-call
//! [`CallContext`] and translates [`LedgerError`] through its fixed status
//! table. Domain errors are logged here with their full cause; only the
//! fixed public message crosses the wire.

use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Response, Status};
use tracing::{error, info, warn};

use super::account_service::account_service_server::AccountService as AccountRpc;
use super::messages::{
    CreateAccountRequest, CreateAccountResponse, TransferRequest as TransferRequestMsg,
    TransferResponse,
};
use super::transfer_service::transfer_service_server::TransferService as TransferRpc;
use crate::account::AccountService;
use crate::correlation::{self, CallContext, CorrelationId};
use crate::error::LedgerError;
use crate::models::{Account, TransferRequest, parse_money};
use crate::transfer::TransferService;

/// Lift the `correlation_id` metadata into a typed request extension.
///
/// Missing or malformed values leave the call untraced rather than rejecting it.
pub fn correlation_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(id) = correlation::from_metadata(request.metadata()) {
        request.extensions_mut().insert(id);
    }
    Ok(request)
}

fn call_context<T>(request: &Request<T>, timeout: Duration) -> CallContext {
    let id = request
        .extensions()
        .get::<CorrelationId>()
        .copied()
        .or_else(|| correlation::from_metadata(request.metadata()));
    CallContext::new(id).with_timeout(timeout)
}

fn log_failure(ctx: &CallContext, op: &str, err: &LedgerError) {
    match err {
        LedgerError::SystemError(_) => error!(
            correlation_id = ctx.correlation_value(),
            op,
            code = err.code(),
            error = %err,
            "RPC failed"
        ),
        _ => warn!(
            correlation_id = ctx.correlation_value(),
            op,
            code = err.code(),
            error = %err,
            "RPC rejected"
        ),
    }
}

#[derive(Clone)]
pub struct LedgerRpcHandler {
    accounts: Arc<AccountService>,
    transfers: Arc<TransferService>,
    request_timeout: Duration,
}

impl LedgerRpcHandler {
    pub fn new(
        accounts: Arc<AccountService>,
        transfers: Arc<TransferService>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            transfers,
            request_timeout,
        }
    }
}

#[tonic::async_trait]
impl AccountRpc for LedgerRpcHandler {
    async fn create_account(
        &self,
        request: Request<CreateAccountRequest>,
    ) -> Result<Response<CreateAccountResponse>, Status> {
        let ctx = call_context(&request, self.request_timeout);
        let req = request.into_inner();

        let result = match parse_money(&req.balance) {
            Ok(balance) => {
                self.accounts
                    .create_account(&ctx, &Account::new(req.account_id, balance))
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => Ok(Response::new(CreateAccountResponse { success: true })),
            Err(e) => {
                log_failure(&ctx, "CreateAccount", &e);
                Err(e.rpc_status())
            }
        }
    }
}

#[tonic::async_trait]
impl TransferRpc for LedgerRpcHandler {
    async fn make_transfer(
        &self,
        request: Request<TransferRequestMsg>,
    ) -> Result<Response<TransferResponse>, Status> {
        let ctx = call_context(&request, self.request_timeout);
        let req = request.into_inner();

        let amount = match parse_money(&req.amount) {
            Ok(a) => a,
            Err(e) => {
                log_failure(&ctx, "MakeTransfer", &e);
                return Err(e.rpc_status());
            }
        };

        let domain_req = TransferRequest::new(req.source_id, req.destination_id, amount);
        match self.transfers.make_transfer(&ctx, &domain_req).await {
            Ok(result) => {
                info!(
                    correlation_id = ctx.correlation_value(),
                    audit_id = result.audit_id,
                    "MakeTransfer ok"
                );
                Ok(Response::new(TransferResponse {
                    success: true,
                    transaction_id: result.audit_id,
                    audit_id: result.audit_id,
                    new_source_balance: result.source_post_balance.to_string(),
                    correlation_id: ctx.correlation_value(),
                }))
            }
            Err(e) => {
                log_failure(&ctx, "MakeTransfer", &e);
                Err(e.rpc_status())
            }
        }
    }
}
