//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::wallet::WalletError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Wallet core errors, mapped by kind
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl AppError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

const GENERIC_SERVER_ERROR: &str = "Internal server error";
const GENERIC_UNAVAILABLE: &str = "Service temporarily unavailable, retry the request";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // Wallet errors - map to appropriate HTTP status
            AppError::Wallet(wallet_err) => match wallet_err {
                WalletError::AccountNotFound(id) => {
                    (StatusCode::NOT_FOUND, "account_not_found", Some(id.to_string()))
                }
                WalletError::InsufficientFunds { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", Some(wallet_err.to_string()))
                }
                WalletError::SameAccountTransfer => {
                    (StatusCode::BAD_REQUEST, "same_account_transfer", None)
                }
                WalletError::UnsupportedOperation(op) => {
                    (StatusCode::BAD_REQUEST, "unsupported_operation", Some(op.to_string()))
                }
                err if err.is_retryable() => {
                    tracing::warn!(
                        phase = ?err.transfer_phase(),
                        kind = ?err.store_kind(),
                        "Retryable store error: {}",
                        err
                    );
                    let code = err.store_kind().map(|k| k.as_str()).unwrap_or("store_unavailable");
                    (StatusCode::SERVICE_UNAVAILABLE, code, None)
                }
                err => {
                    tracing::error!(
                        phase = ?err.transfer_phase(),
                        kind = ?err.store_kind(),
                        "Store error: {}",
                        err
                    );
                    (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
                }
            },
        };

        // Server-side details stay in the log
        let error = match status {
            StatusCode::INTERNAL_SERVER_ERROR => GENERIC_SERVER_ERROR.to_string(),
            StatusCode::SERVICE_UNAVAILABLE => GENERIC_UNAVAILABLE.to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
