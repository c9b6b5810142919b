use crate::config::AppConfig;
use crate::domain::account::{Account, AccountId};
use crate::domain::coupon::{Coupon, CouponCode, Redemption};
use crate::domain::document::{DocumentLimits, DocumentSummary};
use crate::domain::egress::{EgressPolicy, UpstreamStatus};
use crate::domain::ports::{FetcherBox, LedgerStoreBox};
use crate::domain::pricing::{PriceQuote, PricingPolicy};
use crate::domain::principal::Principal;
use crate::domain::transfer::{Transfer, TransferReceipt};
use crate::error::{Result, ShopError};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The main entry point for the storefront's business operations.
///
/// `ShopService` owns the ledger and the outbound fetcher and applies the
/// configured policies. Authorization is checked here, not in the HTTP
/// layer, so every caller of the service gets the same rules.
pub struct ShopService {
    ledger: LedgerStoreBox,
    fetcher: FetcherBox,
    coupons: HashMap<CouponCode, Coupon>,
    pricing: PricingPolicy,
    egress: EgressPolicy,
    documents: DocumentLimits,
    config: AppConfig,
}

impl ShopService {
    /// Creates a new `ShopService` instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated service configuration.
    /// * `ledger` - The store for balances and coupon usage.
    /// * `fetcher` - Outbound HTTP used by [`ShopService::fetch_status`].
    pub fn new(config: AppConfig, ledger: LedgerStoreBox, fetcher: FetcherBox) -> Result<Self> {
        config.validate()?;
        let coupons = config
            .coupon_catalog()
            .into_iter()
            .map(|coupon| (coupon.code.clone(), coupon))
            .collect();
        Ok(Self {
            ledger,
            fetcher,
            coupons,
            pricing: config.pricing.policy()?,
            egress: config.egress.policy()?,
            documents: config.documents.limits(),
            config,
        })
    }

    /// Opens the configured seed accounts. Accounts that already exist keep
    /// their balance. Returns the number of accounts created.
    pub async fn bootstrap(&self) -> Result<usize> {
        let mut created = 0;
        for seed in &self.config.accounts {
            let account = Account::new(seed.id.clone(), seed.balance);
            if self.ledger.open_account(account).await? {
                debug!(account = %seed.id, balance = %seed.balance, "opened seed account");
                created += 1;
            }
        }
        Ok(created)
    }

    pub async fn transfer(
        &self,
        principal: &Principal,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<TransferReceipt> {
        let transfer = Transfer::parse(from, to, amount)?;
        principal
            .authorize_account(transfer.from())
            .inspect_err(|e| warn!(principal = %principal.id, error = %e, "transfer denied"))?;

        let receipt = self.ledger.transfer(&transfer).await?;
        info!(
            principal = %principal.id,
            from = %receipt.from.id,
            to = %receipt.to.id,
            amount = %receipt.amount,
            "transfer committed"
        );
        Ok(receipt)
    }

    pub async fn apply_coupon(
        &self,
        principal: &Principal,
        user: &str,
        coupon: &str,
    ) -> Result<Redemption> {
        let account: AccountId = user.parse()?;
        let code: CouponCode = coupon.parse()?;
        principal
            .authorize_account(&account)
            .inspect_err(|e| warn!(principal = %principal.id, error = %e, "coupon denied"))?;

        let coupon = self
            .coupons
            .get(&code)
            .ok_or_else(|| ShopError::UnknownCoupon(code.to_string()))?;

        match self.ledger.redeem_coupon(coupon, &account).await? {
            Redemption::AlreadyRedeemed { by } => {
                warn!(
                    principal = %principal.id,
                    coupon = %code,
                    redeemed_by = %by,
                    "coupon reuse rejected"
                );
                Err(ShopError::CouponAlreadyRedeemed(code.to_string()))
            }
            redeemed @ Redemption::Redeemed { .. } => {
                info!(
                    principal = %principal.id,
                    account = %account,
                    coupon = %code,
                    "coupon redeemed"
                );
                Ok(redeemed)
            }
        }
    }

    /// Requests `url` on behalf of `principal` and reports the upstream status.
    pub async fn fetch_status(&self, principal: &Principal, url: &str) -> Result<UpstreamStatus> {
        let target = self
            .egress
            .check_url(url)
            .inspect_err(|e| warn!(principal = %principal.id, error = %e, "egress denied"))?;

        let addrs = match target.literal {
            Some(ip) => vec![std::net::SocketAddr::new(ip, target.port)],
            None => self.fetcher.resolve(&target.host, target.port).await?,
        };
        self.egress.check_addrs(&addrs).inspect_err(|e| {
            warn!(
                principal = %principal.id,
                host = %target.host,
                error = %e,
                "egress denied after resolution"
            )
        })?;

        let status = self.fetcher.status(&target, &addrs).await?;
        info!(
            principal = %principal.id,
            url = %status.url,
            status = status.status,
            "fetched upstream status"
        );
        Ok(status)
    }

    pub fn inspect_document(&self, body: &[u8]) -> Result<DocumentSummary> {
        self.documents.inspect(body)
    }

    /// Prices are derived from the caller's server-side role only.
    pub fn quote_price(&self, principal: Option<&Principal>) -> PriceQuote {
        self.pricing.quote(principal)
    }

    /// Redacted TOML rendering of the running configuration.
    pub fn export_config(&self, principal: &Principal) -> Result<String> {
        principal
            .require_admin()
            .inspect_err(|e| warn!(principal = %principal.id, error = %e, "config export denied"))?;
        info!(principal = %principal.id, "config exported");
        self.config.redacted().to_toml()
    }

    pub async fn accounts(&self, principal: &Principal) -> Result<Vec<Account>> {
        principal.require_admin()?;
        self.ledger.all_accounts().await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
