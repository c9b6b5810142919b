#![allow(dead_code)]

use async_trait::async_trait;
use shopfront::application::auth::TokenAuthenticator;
use shopfront::application::service::ShopService;
use shopfront::config::AppConfig;
use shopfront::domain::egress::{EgressTarget, UpstreamStatus};
use shopfront::domain::ports::Fetcher;
use shopfront::error::Result;
use shopfront::infrastructure::in_memory::InMemoryLedgerStore;
use shopfront::interfaces::http::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const ROOT_TOKEN: &str = "root-token";
pub const CAROL_TOKEN: &str = "carol-token";

pub const CONFIG: &str = r#"
[[accounts]]
id = "alice"
balance = "100"

[[accounts]]
id = "bob"
balance = "50"

[[accounts]]
id = "carol"
balance = "0"

[[coupons]]
code = "WELCOME50"
credit = "50"

[[users]]
id = "alice"
role = "customer"
token_sha256 = "9c220f200955d76c0a38d308225e0ef10c5f971acaf2f8d1d8f732affa5bd1dc"

[[users]]
id = "bob"
token_sha256 = "97dd3707015dcf069cf73022ed7173b1165db6eff24b441cb57fd069a8c4e525"

[[users]]
id = "carol"
role = "vip"
token_sha256 = "6c0d2c0b430d9d9e3231e2645090c735a5059173d4ddf51f186e3f32e01bc832"

[[users]]
id = "root"
role = "admin"
token_sha256 = "2cff60a244379d429c1877c36ee7f37da39ad06073d31b8d90fccd15376f2adf"

[egress]
allowed_ports = [80, 443]

[documents]
max_bytes = 256
max_depth = 4
"#;

/// Fetcher with canned DNS answers that records every outbound request.
#[derive(Clone, Default)]
pub struct StubFetcher {
    pub dns: Arc<HashMap<String, Vec<SocketAddr>>>,
    pub requests: Arc<Mutex<Vec<(String, Vec<SocketAddr>)>>>,
}

impl StubFetcher {
    pub fn with_dns(entries: &[(&str, &str)]) -> Self {
        let mut dns: HashMap<String, Vec<SocketAddr>> = HashMap::new();
        for (host, addr) in entries {
            dns.entry(host.to_string())
                .or_default()
                .push(addr.parse().unwrap());
        }
        Self {
            dns: Arc::new(dns),
            requests: Arc::default(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn resolve(&self, host: &str, _port: u16) -> Result<Vec<SocketAddr>> {
        Ok(self.dns.get(host).cloned().unwrap_or_default())
    }

    async fn status(
        &self,
        target: &EgressTarget,
        addrs: &[SocketAddr],
    ) -> Result<UpstreamStatus> {
        self.requests
            .lock()
            .unwrap()
            .push((target.url.to_string(), addrs.to_vec()));
        Ok(UpstreamStatus {
            url: target.url.to_string(),
            status: 200,
            reason: "OK".to_string(),
        })
    }
}

pub fn config() -> AppConfig {
    AppConfig::from_toml(CONFIG).expect("test config is valid")
}

pub async fn service_with(fetcher: StubFetcher) -> ShopService {
    let service = ShopService::new(
        config(),
        Box::new(InMemoryLedgerStore::new()),
        Box::new(fetcher),
    )
    .unwrap();
    service.bootstrap().await.unwrap();
    service
}

pub async fn service() -> ShopService {
    service_with(StubFetcher::default()).await
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub fetcher: StubFetcher,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(fetcher: StubFetcher) -> Self {
        let service = service_with(fetcher.clone()).await;
        let auth = TokenAuthenticator::from_users(&service.config().users).unwrap();
        let state = AppState::new(service, auth);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            http::serve(listener, state, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            fetcher,
            shutdown: Some(tx),
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{}", self.base, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: impl Into<reqwest::Body>,
    ) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}{}", self.base, path))
            .header("content-type", "application/json")
            .body(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
