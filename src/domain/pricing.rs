use super::principal::{Principal, Role};
use crate::error::ShopError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Price tier a quote was computed for.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Vip,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PriceQuote {
    pub tier: Tier,
    pub base: Decimal,
    pub discount_percent: u8,
    pub price: Decimal,
}

/// Computes prices from server-side entitlements only.
///
/// The discount is derived from the caller's [`Role`]; nothing supplied by
/// the client can select the VIP tier.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    base: Decimal,
    vip_discount_percent: u8,
}

impl PricingPolicy {
    pub fn new(base: Decimal, vip_discount_percent: u8) -> Result<Self, ShopError> {
        if base.is_sign_negative() {
            return Err(ShopError::ValidationError(
                "Base price must not be negative".to_string(),
            ));
        }
        if vip_discount_percent > 100 {
            return Err(ShopError::ValidationError(
                "VIP discount must be between 0 and 100 percent".to_string(),
            ));
        }
        Ok(Self {
            base,
            vip_discount_percent,
        })
    }

    pub fn tier_for(principal: Option<&Principal>) -> Tier {
        match principal.map(|p| p.role) {
            Some(Role::Vip) | Some(Role::Admin) => Tier::Vip,
            Some(Role::Customer) | None => Tier::Standard,
        }
    }

    pub fn quote(&self, principal: Option<&Principal>) -> PriceQuote {
        let tier = Self::tier_for(principal);
        let discount_percent = match tier {
            Tier::Standard => 0,
            Tier::Vip => self.vip_discount_percent,
        };
        let remaining = Decimal::from(100 - discount_percent) / Decimal::ONE_HUNDRED;
        PriceQuote {
            tier,
            base: self.base,
            discount_percent,
            price: (self.base * remaining).normalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountId;
    use rust_decimal_macros::dec;

    fn principal(role: Role) -> Principal {
        Principal::new(AccountId::new("carol").unwrap(), role)
    }

    #[test]
    fn test_anonymous_and_customer_pay_base_price() {
        let policy = PricingPolicy::new(dec!(100), 90).unwrap();
        assert_eq!(policy.quote(None).price, dec!(100));
        let quote = policy.quote(Some(&principal(Role::Customer)));
        assert_eq!(quote.price, dec!(100));
        assert_eq!(quote.tier, Tier::Standard);
        assert_eq!(quote.discount_percent, 0);
    }

    #[test]
    fn test_vip_gets_configured_discount() {
        let policy = PricingPolicy::new(dec!(100), 90).unwrap();
        let quote = policy.quote(Some(&principal(Role::Vip)));
        assert_eq!(quote.tier, Tier::Vip);
        assert_eq!(quote.price, dec!(10));
    }

    #[test]
    fn test_discount_bounds() {
        assert!(PricingPolicy::new(dec!(100), 101).is_err());
        assert!(PricingPolicy::new(dec!(-1), 0).is_err());
        let free = PricingPolicy::new(dec!(19.99), 100).unwrap();
        assert_eq!(free.quote(Some(&principal(Role::Admin))).price, dec!(0));
    }
}
