//! Account management module
//!
//! PostgreSQL-backed account rows, fronted by the existence cache.

pub mod repository;
pub mod service;

pub use repository::{AccountRepository, PgAccountRepository};
pub use service::AccountService;
