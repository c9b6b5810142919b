use crate::domain::account::{Account, AccountId};
use crate::domain::coupon::{Coupon, CouponCode, Redemption};
use crate::domain::ports::LedgerStore;
use crate::domain::transfer::{Transfer, TransferReceipt};
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing coupon usage records.
pub const CF_COUPONS: &str = "coupons";

/// A persistent ledger implementation using RocksDB.
///
/// Accounts and coupon usage records live in separate Column Families.
/// Mutations are read-check-write sequences committed as one `WriteBatch`
/// while holding `writer`, which makes them atomic with respect to each
/// other and durable once they return.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBLedgerStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDBLedgerStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("accounts" and "coupons") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_coupons = ColumnFamilyDescriptor::new(CF_COUPONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_coupons])?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ShopError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db.get_cf(cf, key)?.map(|bytes| decode(&bytes)).transpose()
    }

    fn account(&self, id: &AccountId) -> Result<Account> {
        self.read(CF_ACCOUNTS, id.as_str().as_bytes())?
            .ok_or_else(|| ShopError::UnknownAccount(id.to_string()))
    }

    fn put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &[u8],
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(|e| ShopError::InternalError(Box::new(e)))?;
        batch.put_cf(cf, key, bytes);
        Ok(())
    }
}

/// A stored value that fails to decode is a corrupt record, not bad input.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ShopError::InternalError(Box::new(e)))
}

#[async_trait]
impl LedgerStore for RocksDBLedgerStore {
    async fn open_account(&self, account: Account) -> Result<bool> {
        let _guard = self.writer.lock().await;
        let key = account.id.as_str().as_bytes();
        if self.read::<Account>(CF_ACCOUNTS, key)?.is_some() {
            return Ok(false);
        }
        let mut batch = WriteBatch::default();
        self.put(&mut batch, CF_ACCOUNTS, key, &account)?;
        self.db.write(batch)?;
        Ok(true)
    }

    async fn get(&self, id: &AccountId) -> Result<Option<Account>> {
        self.read(CF_ACCOUNTS, id.as_str().as_bytes())
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        // Keys are account ids, so iteration order is already sorted by id.
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(decode::<Account>(&value)?);
        }
        Ok(accounts)
    }

    async fn transfer(&self, transfer: &Transfer) -> Result<TransferReceipt> {
        let _guard = self.writer.lock().await;
        let mut from = self.account(transfer.from())?;
        let mut to = self.account(transfer.to())?;

        from.debit(transfer.amount())?;
        to.credit(transfer.amount());

        let mut batch = WriteBatch::default();
        self.put(&mut batch, CF_ACCOUNTS, from.id.as_str().as_bytes(), &from)?;
        self.put(&mut batch, CF_ACCOUNTS, to.id.as_str().as_bytes(), &to)?;
        self.db.write(batch)?;

        Ok(TransferReceipt {
            from,
            to,
            amount: transfer.amount(),
        })
    }

    async fn redeem_coupon(&self, coupon: &Coupon, account: &AccountId) -> Result<Redemption> {
        let _guard = self.writer.lock().await;
        let code_key = coupon.code.as_str().as_bytes();
        if let Some(by) = self.read::<AccountId>(CF_COUPONS, code_key)? {
            return Ok(Redemption::AlreadyRedeemed { by });
        }
        let mut target = self.account(account)?;
        target.credit(coupon.credit);

        let mut batch = WriteBatch::default();
        self.put(&mut batch, CF_ACCOUNTS, target.id.as_str().as_bytes(), &target)?;
        self.put(&mut batch, CF_COUPONS, code_key, &target.id)?;
        self.db.write(batch)?;

        Ok(Redemption::Redeemed {
            account: target.id,
            balance: target.balance,
        })
    }

    async fn redeemed_by(&self, code: &CouponCode) -> Result<Option<AccountId>> {
        self.read(CF_COUPONS, code.as_str().as_bytes())
    }
}
