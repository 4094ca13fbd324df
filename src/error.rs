use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Service-level error taxonomy.
///
/// `Config` and `Index` are fatal at boot. `Upstream` means a chat or
/// embedding call exhausted its retries and the turn fails visibly.
/// `Validation` is recoverable and surfaces as a client error. An empty
/// retrieval result is not an error (the QA phase returns a canned reply).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("index unavailable: {0}")]
    Index(String),

    #[error("upstream service error: {0}")]
    Upstream(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Wrap a low-level client failure as an upstream error.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!("request failed: {self}");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_client_error() {
        let resp = AppError::Validation("bad field".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let resp = AppError::Upstream("chat timed out".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_index_maps_to_server_error() {
        let resp = AppError::Index("missing".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
