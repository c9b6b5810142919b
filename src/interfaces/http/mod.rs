//! HTTP adapter: router, extractors and handlers.

pub mod auth;
pub mod error;
pub mod handlers;

use crate::application::auth::TokenAuthenticator;
use crate::application::service::ShopService;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ShopService>,
    pub auth: Arc<TokenAuthenticator>,
}

impl AppState {
    pub fn new(service: ShopService, auth: TokenAuthenticator) -> Self {
        Self {
            service: Arc::new(service),
            auth: Arc::new(auth),
        }
    }
}

/// Builds the storefront router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.service.config().documents.max_bytes;
    Router::new()
        .route("/health", get(handlers::health))
        .route("/transfer", get(handlers::transfer))
        .route("/apply-coupon", get(handlers::apply_coupon))
        .route("/ssrf", get(handlers::fetch_url))
        .route(
            "/unmarshal",
            post(handlers::unmarshal).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/price", get(handlers::price))
        .route("/download-config", get(handlers::download_config))
        .route("/accounts", get(handlers::accounts))
        .with_state(state)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "storefront listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
