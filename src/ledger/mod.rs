//! Ledger Store and Transfer Engine
//!
//! - `backend`: storage seam (one open transaction = one [`LedgerTx`])
//! - `engine`: lock ordering, funds check, audit trail
//! - `pg`: PostgreSQL implementation

pub mod backend;
pub mod engine;
#[cfg(test)]
pub mod memory;
pub mod pg;

pub use backend::{AuditStamp, LedgerBackend, LedgerTx, PendingAudit};
pub use engine::{TransferEngine, lock_order};
pub use pg::PgLedgerBackend;
