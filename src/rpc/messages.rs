//! Wire messages for package `ledger.v1`.
//!
//! Money fields are decimal strings; binary floats never cross the wire.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateAccountRequest {
    #[prost(int64, tag = "1")]
    pub account_id: i64,
    #[prost(string, tag = "2")]
    pub balance: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateAccountResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransferRequest {
    #[prost(int64, tag = "1")]
    pub source_id: i64,
    #[prost(int64, tag = "2")]
    pub destination_id: i64,
    #[prost(string, tag = "3")]
    pub amount: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransferResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    /// Same value as `audit_id`
    #[prost(int64, tag = "2")]
    pub transaction_id: i64,
    #[prost(int64, tag = "3")]
    pub audit_id: i64,
    #[prost(string, tag = "4")]
    pub new_source_balance: ::prost::alloc::string::String,
    /// 0 when the call was untraced
    #[prost(int64, tag = "5")]
    pub correlation_id: i64,
}
