use crate::domain::account::{Account, AccountId, Balance};
use crate::domain::coupon::{Coupon, CouponCode, Redemption};
use crate::domain::ports::LedgerStore;
use crate::domain::transfer::{Transfer, TransferReceipt};
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    balances: HashMap<AccountId, Balance>,
    redemptions: HashMap<CouponCode, AccountId>,
}

impl LedgerState {
    fn account(&self, id: &AccountId) -> Result<Account> {
        self.balances
            .get(id)
            .map(|balance| Account::new(id.clone(), *balance))
            .ok_or_else(|| ShopError::UnknownAccount(id.to_string()))
    }
}

/// A thread-safe in-memory ledger.
///
/// Balances and coupon usage live behind one `Arc<RwLock<..>>`, so every
/// check-and-act sequence runs under a single write guard.
/// Ideal for testing or deployments where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn open_account(&self, account: Account) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.balances.contains_key(&account.id) {
            return Ok(false);
        }
        state.balances.insert(account.id, account.balance);
        Ok(true)
    }

    async fn get(&self, id: &AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.account(id).ok())
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .balances
            .iter()
            .map(|(id, balance)| Account::new(id.clone(), *balance))
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    async fn transfer(&self, transfer: &Transfer) -> Result<TransferReceipt> {
        let mut state = self.state.write().await;
        let mut from = state.account(transfer.from())?;
        let mut to = state.account(transfer.to())?;

        from.debit(transfer.amount())?;
        to.credit(transfer.amount());

        state.balances.insert(from.id.clone(), from.balance);
        state.balances.insert(to.id.clone(), to.balance);
        Ok(TransferReceipt {
            from,
            to,
            amount: transfer.amount(),
        })
    }

    async fn redeem_coupon(&self, coupon: &Coupon, account: &AccountId) -> Result<Redemption> {
        let mut state = self.state.write().await;
        if let Some(by) = state.redemptions.get(&coupon.code) {
            return Ok(Redemption::AlreadyRedeemed { by: by.clone() });
        }
        let mut target = state.account(account)?;
        target.credit(coupon.credit);

        state.balances.insert(target.id.clone(), target.balance);
        state
            .redemptions
            .insert(coupon.code.clone(), target.id.clone());
        Ok(Redemption::Redeemed {
            account: target.id,
            balance: target.balance,
        })
    }

    async fn redeemed_by(&self, code: &CouponCode) -> Result<Option<AccountId>> {
        let state = self.state.read().await;
        Ok(state.redemptions.get(code).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Amount;
    use rust_decimal_macros::dec;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    async fn seeded() -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        store
            .open_account(Account::new(id("alice"), Balance::new(dec!(100))))
            .await
            .unwrap();
        store
            .open_account(Account::new(id("bob"), Balance::new(dec!(50))))
            .await
            .unwrap();
        store
    }

    fn coupon(code: &str, credit: rust_decimal::Decimal) -> Coupon {
        Coupon {
            code: code.parse().unwrap(),
            credit: Amount::new(credit).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_open_account_keeps_existing_balance() {
        let store = seeded().await;
        let inserted = store
            .open_account(Account::new(id("alice"), Balance::ZERO))
            .await
            .unwrap();
        assert!(!inserted);
        let alice = store.get(&id("alice")).await.unwrap().unwrap();
        assert_eq!(alice.balance, Balance::new(dec!(100)));
        assert!(store.get(&id("carol")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_accounts_sorted() {
        let store = seeded().await;
        let ids: Vec<String> = store
            .all_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id.to_string())
            .collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let store = seeded().await;
        let receipt = store
            .transfer(&Transfer::parse("alice", "bob", "30").unwrap())
            .await
            .unwrap();
        assert_eq!(receipt.from.balance, Balance::new(dec!(70)));
        assert_eq!(receipt.to.balance, Balance::new(dec!(80)));
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds_leaves_state_untouched() {
        let store = seeded().await;
        let result = store
            .transfer(&Transfer::parse("bob", "alice", "50.0001").unwrap())
            .await;
        assert!(matches!(result, Err(ShopError::InsufficientFunds(_))));
        let bob = store.get(&id("bob")).await.unwrap().unwrap();
        assert_eq!(bob.balance, Balance::new(dec!(50)));
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_account() {
        let store = seeded().await;
        let result = store
            .transfer(&Transfer::parse("alice", "mallory", "1").unwrap())
            .await;
        assert!(matches!(result, Err(ShopError::UnknownAccount(_))));
        let alice = store.get(&id("alice")).await.unwrap().unwrap();
        assert_eq!(alice.balance, Balance::new(dec!(100)));
    }

    #[tokio::test]
    async fn test_coupon_redeemed_once() {
        let store = seeded().await;
        let welcome = coupon("WELCOME50", dec!(50));

        let first = store.redeem_coupon(&welcome, &id("bob")).await.unwrap();
        assert_eq!(
            first,
            Redemption::Redeemed {
                account: id("bob"),
                balance: Balance::new(dec!(100)),
            }
        );

        let second = store.redeem_coupon(&welcome, &id("bob")).await.unwrap();
        assert_eq!(second, Redemption::AlreadyRedeemed { by: id("bob") });

        let bob = store.get(&id("bob")).await.unwrap().unwrap();
        assert_eq!(bob.balance, Balance::new(dec!(100)));
        assert_eq!(
            store.redeemed_by(&welcome.code).await.unwrap(),
            Some(id("bob"))
        );
    }

    #[tokio::test]
    async fn test_coupon_for_unknown_account_stays_unused() {
        let store = seeded().await;
        let welcome = coupon("WELCOME50", dec!(50));
        let result = store.redeem_coupon(&welcome, &id("mallory")).await;
        assert!(matches!(result, Err(ShopError::UnknownAccount(_))));
        assert_eq!(store.redeemed_by(&welcome.code).await.unwrap(), None);
    }
}
