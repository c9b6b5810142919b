use super::account::AccountId;
use crate::error::ShopError;
use serde::{Deserialize, Serialize};

/// Server-side entitlement of an authenticated caller.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Vip,
    Admin,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: AccountId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: AccountId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Succeeds when the principal owns `account` or is an administrator.
    pub fn authorize_account(&self, account: &AccountId) -> Result<(), ShopError> {
        if self.is_admin() || &self.id == account {
            Ok(())
        } else {
            Err(ShopError::Forbidden(format!(
                "{} may not act on account {}",
                self.id, account
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), ShopError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ShopError::Forbidden(format!(
                "{} is not an administrator",
                self.id
            )))
        }
    }
}
