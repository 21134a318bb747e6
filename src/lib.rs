//! Account Transfer Ledger
//!
//! Atomic transfers between accounts over a PostgreSQL ledger, with a gRPC
//! core and an HTTP edge.
//!
//! # Modules
//!
//! - [`models`] - Account, transfer request and audit row types
//! - [`error`] - Closed error taxonomy and its boundary mappings
//! - [`correlation`] - Correlation ids, snowflake allocation, per-call context
//! - [`ledger`] - Transfer engine over a transactional store
//! - [`cache`] - Account existence cache
//! - [`account`] - Account creation, lookup, cache warm-up
//! - [`transfer`] - Transfer orchestration
//! - [`rpc`] - Core gRPC services
//! - [`gateway`] - HTTP edge
//! - [`db`] - PostgreSQL pool and schema

pub mod config;
pub mod logging;

pub mod error;
pub mod models;
pub mod retry;

pub mod correlation;

// Storage
pub mod cache;
pub mod db;
pub mod ledger;

// Services
pub mod account;
pub mod transfer;

// Boundaries
pub mod gateway;
pub mod rpc;

// Convenient re-exports at crate root
pub use correlation::{CallContext, CorrelationId};
pub use error::{LedgerError, LedgerResult};
pub use models::{Account, TransferRecord, TransferRequest, TransferResult, TransferStatus};
