use super::account::{Account, AccountId};
use super::coupon::{Coupon, CouponCode, Redemption};
use super::egress::{EgressTarget, UpstreamStatus};
use super::transfer::{Transfer, TransferReceipt};
use crate::error::Result;
use async_trait::async_trait;
use std::net::SocketAddr;

/// Ledger state: account balances and coupon usage records.
///
/// Every mutating method is a single atomic step; implementations must not
/// expose intermediate states to concurrent callers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts `account` unless an account with the same id exists.
    /// Returns whether the account was inserted.
    async fn open_account(&self, account: Account) -> Result<bool>;
    async fn get(&self, id: &AccountId) -> Result<Option<Account>>;
    async fn all_accounts(&self) -> Result<Vec<Account>>;
    async fn transfer(&self, transfer: &Transfer) -> Result<TransferReceipt>;
    async fn redeem_coupon(&self, coupon: &Coupon, account: &AccountId) -> Result<Redemption>;
    async fn redeemed_by(&self, code: &CouponCode) -> Result<Option<AccountId>>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;

/// Outbound HTTP used by the URL fetch endpoint.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>>;
    /// Requests `target` using only `addrs`, without following redirects.
    async fn status(
        &self,
        target: &EgressTarget,
        addrs: &[SocketAddr],
    ) -> Result<UpstreamStatus>;
}

pub type FetcherBox = Box<dyn Fetcher>;
