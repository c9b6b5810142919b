use crate::error::ShopError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// HTTP rendering of a [`ShopError`].
#[derive(Debug)]
pub struct ApiError(pub ShopError);

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShopError::ValidationError(_) | ShopError::JsonError(_) => StatusCode::BAD_REQUEST,
            ShopError::Unauthorized => StatusCode::UNAUTHORIZED,
            ShopError::Forbidden(_) | ShopError::EgressDenied(_) => StatusCode::FORBIDDEN,
            ShopError::UnknownAccount(_) | ShopError::UnknownCoupon(_) => StatusCode::NOT_FOUND,
            ShopError::InsufficientFunds(_) | ShopError::CouponAlreadyRedeemed(_) => {
                StatusCode::CONFLICT
            }
            ShopError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ShopError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            ShopError::UpstreamError(_) => "upstream request failed".to_string(),
            _ if self.status().is_server_error() => "internal error".to_string(),
            err => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = json!({
            "error": self.0.kind(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ShopError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (ShopError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ShopError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ShopError::EgressDenied("x".into()), StatusCode::FORBIDDEN),
            (ShopError::UnknownAccount("x".into()), StatusCode::NOT_FOUND),
            (ShopError::InsufficientFunds("x".into()), StatusCode::CONFLICT),
            (ShopError::CouponAlreadyRedeemed("x".into()), StatusCode::CONFLICT),
            (ShopError::PayloadTooLarge { limit: 1 }, StatusCode::PAYLOAD_TOO_LARGE),
            (ShopError::ConfigError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError(ShopError::IoError(std::io::Error::other("/secret/path")));
        assert_eq!(err.message(), "internal error");
        let err = ApiError(ShopError::InsufficientFunds("alice".into()));
        assert!(err.message().contains("alice"));
    }
}
