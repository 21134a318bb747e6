//! Core RPC boundary (`ledger.v1`)
//!
//! Service stubs are generated by `build.rs` from hand-written prost messages.

pub mod messages;
pub mod server;

pub mod account_service {
    include!(concat!(env!("OUT_DIR"), "/ledger.v1.AccountService.rs"));
}

pub mod transfer_service {
    include!(concat!(env!("OUT_DIR"), "/ledger.v1.TransferService.rs"));
}

pub use account_service::account_service_client::AccountServiceClient;
pub use account_service::account_service_server::AccountServiceServer;
pub use server::{LedgerRpcHandler, correlation_interceptor};
pub use transfer_service::transfer_service_client::TransferServiceClient;
pub use transfer_service::transfer_service_server::TransferServiceServer;
