use super::AppState;
use super::error::ApiError;
use crate::domain::principal::Principal;
use crate::error::ShopError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::warn;

/// Extractor for routes that require a bearer token.
pub struct Authenticated(pub Principal);

/// Extractor for routes where authentication is optional. A present but
/// invalid token is still rejected.
pub struct MaybeAuthenticated(pub Option<Principal>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ShopError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ShopError::Unauthorized)?;
    Ok(Some(token))
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<Principal>, ApiError> {
    match bearer_token(parts)? {
        Some(token) => state.auth.authenticate(token).map(Some).map_err(|e| {
            warn!(path = %parts.uri.path(), "rejected bearer token");
            ApiError(e)
        }),
        None => Ok(None),
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state)? {
            Some(principal) => Ok(Self(principal)),
            None => {
                warn!(path = %parts.uri.path(), "missing bearer token");
                Err(ApiError(ShopError::Unauthorized))
            }
        }
    }
}

impl FromRequestParts<AppState> for MaybeAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}
