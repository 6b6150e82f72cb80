//! Maps the shared `alex_domain::Error` to an HTTP response (§7). No
//! handler panics across the API boundary — every fallible handler returns
//! `Result<_, ApiError>`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json as AxumJson;

pub struct ApiError(pub alex_domain::Error);

impl From<alex_domain::Error> for ApiError {
    fn from(e: alex_domain::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use alex_domain::Error::*;

        let status = match &self.0 {
            PathNotAllowed(_) | FileNotFound(_) => StatusCode::BAD_REQUEST,
            TradeValidationFailed(_) | TradeExpired(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Config(_) => StatusCode::BAD_REQUEST,
            Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, AxumJson(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
