use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Unknown account: {0}")]
    UnknownAccount(String),
    #[error("Unknown coupon: {0}")]
    UnknownCoupon(String),
    #[error("Insufficient funds in account {0}")]
    InsufficientFunds(String),
    #[error("Coupon {0} has already been redeemed")]
    CouponAlreadyRedeemed(String),
    #[error("Payload exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Egress denied: {0}")]
    EgressDenied(String),
    #[error("Upstream error: {0}")]
    UpstreamError(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl ShopError {
    /// Stable machine-readable identifier, used as the `error` field of HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ShopError::ValidationError(_) => "validation",
            ShopError::Unauthorized => "unauthorized",
            ShopError::Forbidden(_) => "forbidden",
            ShopError::UnknownAccount(_) => "unknown_account",
            ShopError::UnknownCoupon(_) => "unknown_coupon",
            ShopError::InsufficientFunds(_) => "insufficient_funds",
            ShopError::CouponAlreadyRedeemed(_) => "coupon_already_redeemed",
            ShopError::PayloadTooLarge { .. } => "payload_too_large",
            ShopError::EgressDenied(_) => "egress_denied",
            ShopError::UpstreamError(_) => "upstream",
            ShopError::ConfigError(_) | ShopError::TomlError(_) => "config",
            ShopError::JsonError(_) => "invalid_json",
            ShopError::IoError(_) | ShopError::InternalError(_) => "internal",
            #[cfg(feature = "storage-rocksdb")]
            ShopError::RocksDbError(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
