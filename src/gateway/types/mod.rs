//! Gateway types module
//!
//! ## Input Types
//! - [`StrictMoney`]: format-validated decimal for API input
//! - [`CreateAccountBody`], [`TransferBody`]: request bodies
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: unified API response wrapper

pub mod money;
pub mod request;
pub mod response;

pub use money::StrictMoney;
pub use request::{CreateAccountBody, TransferBody};
pub use response::{
    AccountCreatedData, ApiResponse, HealthResponse, TransferData, error_response,
};
