use clap::Parser;
use miette::{IntoDiagnostic, Result};
use shopfront::application::auth::TokenAuthenticator;
use shopfront::application::service::ShopService;
use shopfront::config::AppConfig;
use shopfront::domain::ports::LedgerStoreBox;
use shopfront::infrastructure::http_fetcher::ReqwestFetcher;
use shopfront::infrastructure::in_memory::InMemoryLedgerStore;
use shopfront::interfaces::http::{self, AppState};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `server.bind`.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Path to persistent database, overriding `storage.db_path`. Requires the
    /// `storage-rocksdb` feature.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `shopfront=debug`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path).into_diagnostic()?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(db_path) = cli.db_path {
        config.storage.db_path = Some(db_path);
    }

    let ledger = open_ledger(config.storage.db_path.as_deref())?;
    let auth = TokenAuthenticator::from_users(&config.users).into_diagnostic()?;
    if auth.is_empty() {
        warn!("no users configured; every authenticated route will answer 401");
    }
    let fetcher = Box::new(ReqwestFetcher::new(config.egress.timeout()));
    let bind = config.server.bind;

    let service = ShopService::new(config, ledger, fetcher).into_diagnostic()?;
    let created = service.bootstrap().await.into_diagnostic()?;
    info!(created, users = auth.len(), "ledger ready");

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .into_diagnostic()?;
    http::serve(listener, AppState::new(service, auth), shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("storefront stopped");
    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_ledger(db_path: Option<&Path>) -> Result<LedgerStoreBox> {
    use shopfront::infrastructure::rocksdb::RocksDBLedgerStore;

    match db_path {
        Some(path) => {
            // Use persistent storage (RocksDB)
            info!(path = %path.display(), "opening RocksDB ledger");
            Ok(Box::new(RocksDBLedgerStore::open(path).into_diagnostic()?))
        }
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_ledger(db_path: Option<&Path>) -> Result<LedgerStoreBox> {
    match db_path {
        Some(path) => Err(miette::miette!(
            "db_path {} requires the storage-rocksdb feature",
            path.display()
        )),
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
