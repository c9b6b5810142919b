//! Request handlers. Each one extracts its inputs, calls into
//! [`ShopService`](crate::application::service::ShopService) and renders the
//! outcome; no business rule lives here.

use super::AppState;
use super::auth::{Authenticated, MaybeAuthenticated};
use super::error::ApiError;
use crate::domain::account::Account;
use crate::domain::coupon::Redemption;
use crate::domain::document::DocumentSummary;
use crate::domain::egress::UpstreamStatus;
use crate::domain::pricing::{PriceQuote, Tier};
use crate::domain::transfer::TransferReceipt;
use crate::error::ShopError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

type ApiResult<T> = Result<T, ApiError>;

/// Malformed query strings get the standard error body instead of axum's
/// plain-text rejection.
fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ShopError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ShopError::ValidationError(rejection.body_text()))
}

// Missing query parameters decode as empty strings so they reach domain
// validation and produce the standard error body.
#[derive(Debug, Deserialize)]
pub struct TransferParams {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    amt: String,
}

#[derive(Debug, Deserialize)]
pub struct CouponParams {
    #[serde(default)]
    user: String,
    #[serde(default)]
    coupon: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
pub struct PriceParams {
    vip: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn transfer(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    params: Result<Query<TransferParams>, QueryRejection>,
) -> ApiResult<Json<TransferReceipt>> {
    let params = query(params)?;
    let receipt = state
        .service
        .transfer(&principal, &params.from, &params.to, &params.amt)
        .await?;
    Ok(Json(receipt))
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    params: Result<Query<CouponParams>, QueryRejection>,
) -> ApiResult<Json<Redemption>> {
    let params = query(params)?;
    let redemption = state
        .service
        .apply_coupon(&principal, &params.user, &params.coupon)
        .await?;
    Ok(Json(redemption))
}

pub async fn fetch_url(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> ApiResult<Json<UpstreamStatus>> {
    let params = query(params)?;
    let status = state.service.fetch_status(&principal, &params.url).await?;
    Ok(Json(status))
}

pub async fn unmarshal(
    State(state): State<AppState>,
    Authenticated(_principal): Authenticated,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<DocumentSummary>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ShopError::PayloadTooLarge {
                limit: state.service.config().documents.max_bytes,
            }
        } else {
            ShopError::ValidationError(rejection.body_text())
        }
    })?;
    let summary = state.service.inspect_document(&body)?;
    Ok(Json(summary))
}

pub async fn price(
    State(state): State<AppState>,
    MaybeAuthenticated(principal): MaybeAuthenticated,
    params: Result<Query<PriceParams>, QueryRejection>,
) -> ApiResult<Json<PriceQuote>> {
    let params = query(params)?;
    let quote = state.service.quote_price(principal.as_ref());
    if params.vip.as_deref() == Some("true") && quote.tier != Tier::Vip {
        debug!("ignoring client-supplied vip flag");
    }
    Ok(Json(quote))
}

pub async fn download_config(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<impl IntoResponse> {
    let body = state.service.export_config(&principal)?;
    Ok(([(CONTENT_TYPE, "application/toml")], body))
}

pub async fn accounts(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state.service.accounts(&principal).await?;
    Ok(Json(accounts))
}
