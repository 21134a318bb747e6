//! Transfer orchestration: validation and existence gating in front of the engine.

pub mod service;

pub use service::TransferService;
