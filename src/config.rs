//! Configuration parsing and management.
//!
//! The service reads a single TOML file. Every section is optional; missing
//! sections fall back to the defaults below, which reproduce the two seed
//! accounts of the original storefront.

use crate::domain::account::{AccountId, Amount, Balance};
use crate::domain::coupon::{Coupon, CouponCode};
use crate::domain::document::DocumentLimits;
use crate::domain::egress::EgressPolicy;
use crate::domain::pricing::PricingPolicy;
use crate::domain::principal::Role;
use crate::error::{Result, ShopError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder written in place of secrets when the config is exported.
pub const REDACTED: &str = "<redacted>";

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Accounts opened at startup. Persisted balances take precedence.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountSeed>,

    /// Coupon catalog.
    #[serde(default = "default_coupons")]
    pub coupons: Vec<CouponConfig>,

    /// API users and their bearer token digests.
    #[serde(default)]
    pub users: Vec<UserConfig>,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub egress: EgressConfig,

    #[serde(default)]
    pub documents: DocumentsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            accounts: default_accounts(),
            coupons: default_coupons(),
            users: Vec::new(),
            pricing: PricingConfig::default(),
            egress: EgressConfig::default(),
            documents: DocumentsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ShopError::ConfigError(e.to_string()))
    }

    /// Copy of the configuration with every secret replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for user in &mut copy.users {
            user.token_sha256 = REDACTED.to_string();
        }
        copy
    }

    /// Checks cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure_unique("account", self.accounts.iter().map(|a| a.id.as_str()))?;
        ensure_unique("coupon", self.coupons.iter().map(|c| c.code.as_str()))?;
        ensure_unique("user", self.users.iter().map(|u| u.id.as_str()))?;

        if let Some(seed) = self.accounts.iter().find(|a| a.balance.is_negative()) {
            return Err(ShopError::ConfigError(format!(
                "account {} has a negative opening balance",
                seed.id
            )));
        }
        for user in &self.users {
            user.digest()?;
        }
        self.pricing.policy()?;
        self.egress.policy()?;
        if self.egress.timeout_ms == 0 {
            return Err(ShopError::ConfigError(
                "egress.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn coupon_catalog(&self) -> Vec<Coupon> {
        self.coupons
            .iter()
            .map(|c| Coupon {
                code: c.code.clone(),
                credit: c.credit,
            })
            .collect()
    }
}

fn ensure_unique<'a>(what: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ShopError::ConfigError(format!("duplicate {what} {id:?}")));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageConfig {
    /// RocksDB directory. When unset the ledger is kept in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSeed {
    pub id: AccountId,
    pub balance: Balance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponConfig {
    pub code: CouponCode,
    pub credit: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserConfig {
    pub id: AccountId,
    #[serde(default)]
    pub role: Role,
    /// Hex-encoded SHA-256 digest of the user's bearer token.
    pub token_sha256: String,
}

impl UserConfig {
    pub fn digest(&self) -> Result<[u8; 32]> {
        let mut digest = [0u8; 32];
        hex::decode_to_slice(self.token_sha256.trim(), &mut digest).map_err(|e| {
            ShopError::ConfigError(format!(
                "user {} has a malformed token_sha256: {e}",
                self.id
            ))
        })?;
        Ok(digest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    #[serde(default = "default_base_price")]
    pub base_price: Decimal,
    #[serde(default = "default_vip_discount")]
    pub vip_discount_percent: u8,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price: default_base_price(),
            vip_discount_percent: default_vip_discount(),
        }
    }
}

impl PricingConfig {
    pub fn policy(&self) -> Result<PricingPolicy> {
        PricingPolicy::new(self.base_price, self.vip_discount_percent)
            .map_err(|e| ShopError::ConfigError(format!("pricing: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EgressConfig {
    #[serde(default = "default_schemes")]
    pub allowed_schemes: Vec<String>,
    /// Exact host names or `*.suffix` rules. Empty admits any public host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    #[serde(default = "default_ports")]
    pub allowed_ports: Vec<u16>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: default_schemes(),
            allowed_hosts: Vec::new(),
            allowed_ports: default_ports(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EgressConfig {
    pub fn policy(&self) -> Result<EgressPolicy> {
        EgressPolicy::new(
            &self.allowed_schemes,
            &self.allowed_hosts,
            &self.allowed_ports,
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentsConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        let limits = DocumentLimits::default();
        Self {
            max_bytes: limits.max_bytes,
            max_depth: limits.max_depth,
            max_nodes: limits.max_nodes,
        }
    }
}

impl DocumentsConfig {
    pub fn limits(&self) -> DocumentLimits {
        DocumentLimits {
            max_bytes: self.max_bytes,
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_accounts() -> Vec<AccountSeed> {
    [("alice", dec!(100)), ("bob", dec!(50))]
        .into_iter()
        .filter_map(|(id, balance)| {
            Some(AccountSeed {
                id: AccountId::new(id).ok()?,
                balance: Balance::new(balance),
            })
        })
        .collect()
}

fn default_coupons() -> Vec<CouponConfig> {
    CouponCode::new("WELCOME50")
        .ok()
        .zip(Amount::new(dec!(50)).ok())
        .map(|(code, credit)| CouponConfig { code, credit })
        .into_iter()
        .collect()
}

fn default_base_price() -> Decimal {
    dec!(100)
}

fn default_vip_discount() -> u8 {
    90
}

fn default_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_ports() -> Vec<u16> {
    vec![80, 443]
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_bytes() -> usize {
    DocumentLimits::default().max_bytes
}

fn default_max_depth() -> usize {
    DocumentLimits::default().max_depth
}

fn default_max_nodes() -> usize {
    DocumentLimits::default().max_nodes
}
