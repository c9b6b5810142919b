use crate::domain::egress::{EgressTarget, UpstreamStatus};
use crate::domain::ports::Fetcher;
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

/// `reqwest`-backed fetcher.
///
/// A client is built per request so that name resolution can be pinned to
/// the addresses the egress policy approved.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
        let lookup = tokio::net::lookup_host((host, port));
        let addrs = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| ShopError::EgressDenied(format!("resolving {host} timed out")))?
            .map_err(|e| {
                debug!(host, error = %e, "name resolution failed");
                ShopError::EgressDenied(format!("host {host} could not be resolved"))
            })?;
        Ok(addrs.collect())
    }

    async fn status(
        &self,
        target: &EgressTarget,
        addrs: &[SocketAddr],
    ) -> Result<UpstreamStatus> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(self.timeout)
            .no_proxy();
        if target.literal.is_none() {
            builder = builder.resolve_to_addrs(&target.host, addrs);
        }
        let client = builder.build()?;

        let response = client.get(target.url.clone()).send().await?;
        let status = response.status();
        Ok(UpstreamStatus {
            url: target.url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}
