use super::account::{Account, AccountId, Amount};
use crate::error::ShopError;
use serde::Serialize;

/// A validated request to move funds between two distinct accounts.
#[derive(Debug, PartialEq, Clone)]
pub struct Transfer {
    from: AccountId,
    to: AccountId,
    amount: Amount,
}

impl Transfer {
    pub fn new(from: AccountId, to: AccountId, amount: Amount) -> Result<Self, ShopError> {
        if from == to {
            return Err(ShopError::ValidationError(
                "Source and destination accounts must differ".to_string(),
            ));
        }
        Ok(Self { from, to, amount })
    }

    /// Parses raw query parameters into a transfer.
    pub fn parse(from: &str, to: &str, amount: &str) -> Result<Self, ShopError> {
        Self::new(from.parse()?, to.parse()?, amount.parse()?)
    }

    pub fn from(&self) -> &AccountId {
        &self.from
    }

    pub fn to(&self) -> &AccountId {
        &self.to
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Post-transfer state of both accounts.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TransferReceipt {
    pub from: Account,
    pub to: Account,
    pub amount: Amount,
}
