//! HTTP request bodies

use serde::Deserialize;
use utoipa::ToSchema;

use super::money::StrictMoney;
use crate::models::{Account, TransferRequest};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateAccountBody {
    #[schema(example = 100)]
    pub account_id: i64,
    #[schema(value_type = String, example = "1000.00")]
    pub balance: StrictMoney,
}

impl CreateAccountBody {
    pub fn to_account(&self) -> Account {
        Account::new(self.account_id, self.balance.inner())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TransferBody {
    #[schema(example = 100)]
    pub source_account_id: i64,
    #[schema(example = 200)]
    pub destination_account_id: i64,
    #[schema(value_type = String, example = "50.00")]
    pub amount: StrictMoney,
}

impl TransferBody {
    pub fn to_request(&self) -> TransferRequest {
        TransferRequest::new(
            self.source_account_id,
            self.destination_account_id,
            self.amount.inner(),
        )
    }
}
