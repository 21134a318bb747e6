//! Ledger error taxonomy
//!
//! One closed enum shared by the store, the cache and orchestration. Each
//! boundary translates it through a fixed table:
//!
//! ```text
//! LedgerError            → tonic::Code          → HTTP
//! AccountNotFound        → NotFound             → 404
//! InsufficientFunds      → FailedPrecondition   → 422
//! SameAccount, Invalid*  → InvalidArgument      → 400
//! AccountAlreadyExists   → AlreadyExists        → 409
//! SystemError            → Internal             → 500
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tonic::{Code, Status};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Source and destination account cannot be the same: {account_id}")]
    SameAccount { account_id: i64 },

    #[error("Invalid account_id {account_id}: must be positive")]
    InvalidAccountId { account_id: i64 },

    #[error("Amount must be greater than zero")]
    AmountMustBePositive,

    #[error("Invalid amount format: {0}")]
    InvalidAmountFormat(String),

    // === Account Errors ===
    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: i64 },

    #[error("Account already exists: {account_id}")]
    AccountAlreadyExists { account_id: i64 },

    #[error("Insufficient funds in account {account_id}: requested {requested}")]
    InsufficientFunds { account_id: i64, requested: Decimal },

    // === System Errors ===
    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl LedgerError {
    pub fn system(msg: impl Into<String>) -> Self {
        LedgerError::SystemError(msg.into())
    }

    /// Stable error code for logs and metrics
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::SameAccount { .. } => "SAME_ACCOUNT",
            LedgerError::InvalidAccountId { .. } => "INVALID_ACCOUNT_ID",
            LedgerError::AmountMustBePositive => "AMOUNT_MUST_BE_POSITIVE",
            LedgerError::InvalidAmountFormat(_) => "INVALID_AMOUNT_FORMAT",
            LedgerError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            LedgerError::AccountAlreadyExists { .. } => "ACCOUNT_ALREADY_EXISTS",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    pub fn rpc_code(&self) -> Code {
        match self {
            LedgerError::AccountNotFound { .. } => Code::NotFound,
            LedgerError::InsufficientFunds { .. } => Code::FailedPrecondition,
            LedgerError::SameAccount { .. }
            | LedgerError::InvalidAccountId { .. }
            | LedgerError::AmountMustBePositive
            | LedgerError::InvalidAmountFormat(_) => Code::InvalidArgument,
            LedgerError::AccountAlreadyExists { .. } => Code::AlreadyExists,
            LedgerError::SystemError(_) => Code::Internal,
        }
    }

    /// Message sent across the RPC boundary.
    ///
    /// Fixed per kind: the underlying cause of a `SystemError` stays in the
    /// core's logs and never reaches the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            LedgerError::SameAccount { .. } => "source and destination cannot be same",
            LedgerError::InvalidAccountId { .. } => "invalid account_id: must be positive",
            LedgerError::AmountMustBePositive => "amount must be greater than zero",
            LedgerError::InvalidAmountFormat(_) => "invalid amount format",
            LedgerError::AccountNotFound { .. } => "account not found",
            LedgerError::AccountAlreadyExists { .. } => "account already exists",
            LedgerError::InsufficientFunds { .. } => "insufficient funds",
            LedgerError::SystemError(_) => "internal system error",
        }
    }

    pub fn rpc_status(&self) -> Status {
        Status::new(self.rpc_code(), self.public_message())
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::SystemError(format!("database: {}", e))
    }
}

impl From<tokio::time::error::Elapsed> for LedgerError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        LedgerError::SystemError("deadline exceeded".to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
