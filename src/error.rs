//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`. The `IntoResponse` impl turns
//! them into `{"ok": false, "error": ...}` bodies:
//!
//! | Variant          | Status |
//! |------------------|--------|
//! | `BadRequest`     | 400    |
//! | `NotFound`       | 404    |
//! | `Trade`          | 422    |
//! | `Provider`       | 502 (503 when not configured / throttled) |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{engine::LedgerError, intelligence::ProviderError};

#[derive(Debug, Error)]
pub enum AppError {
    /// The request payload was syntactically correct but semantically invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The ledger refused the command. The message names the failed check.
    #[error("{0}")]
    Trade(#[from] LedgerError),

    #[error("Mentor unavailable: {0}")]
    Provider(#[from] ProviderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_)   => StatusCode::NOT_FOUND,
            AppError::Trade(_)      => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Provider(e) if e.is_retryable() || matches!(e, ProviderError::NotConfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Provider(_)   => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
