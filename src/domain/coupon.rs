use super::account::{AccountId, Amount, Balance};
use crate::error::ShopError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_COUPON_LEN: usize = 32;

/// Coupon code, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: &str) -> Result<Self, ShopError> {
        let value = value.trim();
        if value.is_empty() || value.len() > MAX_COUPON_LEN {
            return Err(ShopError::ValidationError(format!(
                "Coupon code must be 1 to {MAX_COUPON_LEN} characters"
            )));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ShopError::ValidationError(format!(
                "Coupon code {value:?} contains invalid characters"
            )));
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CouponCode {
    type Error = ShopError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

impl FromStr for CouponCode {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog entry: redeeming `code` credits `credit` to the redeemer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: CouponCode,
    pub credit: Amount,
}

/// Outcome of a redemption attempt. Repeating a redemption is a no-op that
/// reports who holds the usage record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Redemption {
    Redeemed { account: AccountId, balance: Balance },
    AlreadyRedeemed { by: AccountId },
}
