//! Money type for API boundary enforcement
//!
//! - `StrictMoney`: format-validated decimal input, JSON strings only

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::parse_money;

/// Strict format money amount - validates format during deserialization
///
/// This type provides format validation at the Serde layer:
/// - Rejects JSON numbers (they may already have lost precision)
/// - Rejects `.5` (must be `0.5`)
/// - Rejects `5.` (must be `5.0` or `5`)
/// - Rejects empty strings
/// - Rejects scientific notation
/// - Rejects more fractional digits than the ledger stores
///
/// Sign and range are business rules, checked later by the domain validators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrictMoney(Decimal);

impl StrictMoney {
    /// Get the inner Decimal value
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl std::ops::Deref for StrictMoney {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StrictMoney {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;

        if s.is_empty() {
            return Err(D::Error::custom("Amount cannot be empty"));
        }

        let unsigned = s.strip_prefix('-').unwrap_or(&s);
        if unsigned.starts_with('.') {
            return Err(D::Error::custom("Invalid format: use 0.5 not .5"));
        }
        if unsigned.ends_with('.') {
            return Err(D::Error::custom("Invalid format: use 5.0 not 5."));
        }
        if s.contains('e') || s.contains('E') {
            return Err(D::Error::custom(
                "Invalid format: scientific notation not allowed",
            ));
        }
        if s.starts_with('+') {
            return Err(D::Error::custom("Invalid format: + prefix not allowed"));
        }

        parse_money(&s)
            .map(StrictMoney)
            .map_err(|_| D::Error::custom(format!("Invalid amount: {}", s)))
    }
}

impl Serialize for StrictMoney {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}
