//! Ledger data model: accounts, transfer requests and audit rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::correlation::CorrelationId;
use crate::error::LedgerError;

/// Fractional digits stored by the ledger (`NUMERIC(20, 2)`)
pub const MONEY_SCALE: u32 = 2;

/// Largest magnitude `NUMERIC(20, 2)` can hold: 10^18 - 0.01
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_661_992_959, 1_808_227_885, 5, false, 2);

fn within_range(value: Decimal) -> bool {
    value.abs() <= MAX_MONEY
}

/// Parse a decimal-string amount from the wire.
///
/// Rejects anything `Decimal` cannot parse exactly and anything with more
/// fractional digits than the store keeps, so no value is silently rounded.
/// Magnitudes past [`MAX_MONEY`] are rejected before they reach the store.
pub fn parse_money(raw: &str) -> Result<Decimal, LedgerError> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| LedgerError::InvalidAmountFormat(raw.to_string()))?;
    if value.normalize().scale() > MONEY_SCALE || !within_range(value) {
        return Err(LedgerError::InvalidAmountFormat(raw.to_string()));
    }
    Ok(value)
}

/// Account row. `balance` is never negative after a committed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "account_id")]
    pub id: i64,
    pub balance: Decimal,
}

impl Account {
    pub fn new(id: i64, balance: Decimal) -> Self {
        Self { id, balance }
    }

    pub fn can_withdraw(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Shape checks applied before an account is inserted
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.id <= 0 {
            return Err(LedgerError::InvalidAccountId { account_id: self.id });
        }
        if self.balance < Decimal::ZERO {
            return Err(LedgerError::AmountMustBePositive);
        }
        if !within_range(self.balance) {
            return Err(LedgerError::InvalidAmountFormat(self.balance.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub source_id: i64,
    pub destination_id: i64,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(source_id: i64, destination_id: i64, amount: Decimal) -> Self {
        Self {
            source_id,
            destination_id,
            amount,
        }
    }

    /// Request-shape validation shared by the edge and the core.
    ///
    /// Order matters for the reported error: amount, then ids, then same-account.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::AmountMustBePositive);
        }
        if !within_range(self.amount) {
            return Err(LedgerError::InvalidAmountFormat(self.amount.to_string()));
        }
        if self.source_id <= 0 {
            return Err(LedgerError::InvalidAccountId {
                account_id: self.source_id,
            });
        }
        if self.destination_id <= 0 {
            return Err(LedgerError::InvalidAccountId {
                account_id: self.destination_id,
            });
        }
        if self.source_id == self.destination_id {
            return Err(LedgerError::SameAccount {
                account_id: self.source_id,
            });
        }
        Ok(())
    }
}

/// Audit row status. IDs are stored as SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TransferStatus {
    /// Inserted mid-transaction with pre-balances captured under lock
    Pending = 1,
    /// Both balance writes succeeded, post-balances recorded
    Completed = 2,
}

impl TransferStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransferStatus::Pending),
            2 => Some(TransferStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted audit row for one transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub audit_id: i64,
    pub correlation_id: Option<CorrelationId>,
    pub source_id: i64,
    pub destination_id: i64,
    pub amount: Decimal,
    pub status: TransferStatus,
    pub source_prev_balance: Decimal,
    pub destination_prev_balance: Decimal,
    pub source_post_balance: Option<Decimal>,
    pub destination_post_balance: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a committed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub audit_id: i64,
    pub correlation_id: Option<CorrelationId>,
    pub status: TransferStatus,
    pub source_post_balance: Decimal,
    pub destination_post_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_transfer_request_validate_ok() {
        assert!(TransferRequest::new(100, 200, d("50.00")).validate().is_ok());
    }

    #[test]
    fn test_transfer_request_rejects_non_positive_amount() {
        assert_eq!(
            TransferRequest::new(100, 200, Decimal::ZERO).validate(),
            Err(LedgerError::AmountMustBePositive)
        );
        assert_eq!(
            TransferRequest::new(100, 200, d("-1")).validate(),
            Err(LedgerError::AmountMustBePositive)
        );
    }

    #[test]
    fn test_transfer_request_rejects_bad_ids() {
        assert_eq!(
            TransferRequest::new(0, 200, d("1")).validate(),
            Err(LedgerError::InvalidAccountId { account_id: 0 })
        );
        assert_eq!(
            TransferRequest::new(100, -5, d("1")).validate(),
            Err(LedgerError::InvalidAccountId { account_id: -5 })
        );
    }

    #[test]
    fn test_transfer_request_rejects_same_account() {
        assert_eq!(
            TransferRequest::new(100, 100, d("10.00")).validate(),
            Err(LedgerError::SameAccount { account_id: 100 })
        );
    }

    #[test]
    fn test_account_validate() {
        assert!(Account::new(1, d("0")).validate().is_ok());
        assert!(Account::new(1, d("500.00")).validate().is_ok());
        assert_eq!(
            Account::new(0, d("1")).validate(),
            Err(LedgerError::InvalidAccountId { account_id: 0 })
        );
        assert_eq!(
            Account::new(1, d("-0.01")).validate(),
            Err(LedgerError::AmountMustBePositive)
        );
    }

    #[test]
    fn test_can_withdraw_boundary() {
        let acc = Account::new(1, d("50.00"));
        assert!(acc.can_withdraw(d("50")));
        assert!(!acc.can_withdraw(d("50.01")));
    }

    #[test]
    fn test_status_ids() {
        assert_eq!(TransferStatus::Pending.id(), 1);
        assert_eq!(TransferStatus::Completed.id(), 2);
        assert_eq!(TransferStatus::from_id(2), Some(TransferStatus::Completed));
        assert_eq!(TransferStatus::from_id(3), None);
        assert_eq!(TransferStatus::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("50.00"), Ok(d("50.00")));
        assert_eq!(parse_money(" 7 "), Ok(d("7")));
        // Trailing zeros beyond the scale are harmless
        assert_eq!(parse_money("1.500"), Ok(d("1.500")));
        assert_eq!(
            parse_money("abc"),
            Err(LedgerError::InvalidAmountFormat("abc".to_string()))
        );
        assert_eq!(
            parse_money(""),
            Err(LedgerError::InvalidAmountFormat(String::new()))
        );
        assert_eq!(
            parse_money("0.005"),
            Err(LedgerError::InvalidAmountFormat("0.005".to_string()))
        );
    }

    #[test]
    fn test_money_bounded_by_store_precision() {
        assert_eq!(MAX_MONEY, d("999999999999999999.99"));
        assert_eq!(
            parse_money("999999999999999999.99"),
            Ok(d("999999999999999999.99"))
        );
        assert_eq!(
            parse_money("100000000000000000000"),
            Err(LedgerError::InvalidAmountFormat(
                "100000000000000000000".to_string()
            ))
        );
        assert!(parse_money("1000000000000000000").is_err());
        assert!(parse_money("-1000000000000000000").is_err());

        // Values built in code are held to the same bound
        let huge = d("100000000000000000000");
        assert!(matches!(
            Account::new(1, huge).validate(),
            Err(LedgerError::InvalidAmountFormat(_))
        ));
        assert!(matches!(
            TransferRequest::new(1, 2, huge).validate(),
            Err(LedgerError::InvalidAmountFormat(_))
        ));
        assert!(Account::new(1, MAX_MONEY).validate().is_ok());
    }

    #[test]
    fn test_account_json_uses_account_id() {
        let json = serde_json::to_string(&Account::new(7, d("1.50"))).unwrap();
        assert_eq!(json, r#"{"account_id":7,"balance":"1.50"}"#);
    }
}
