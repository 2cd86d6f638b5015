//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::listing::ListError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("failed to load data")]
    List(#[source] ListError),
}

impl From<ListError> for AppError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::InvalidFilter { .. } => AppError::BadRequest(err.to_string()),
            other => AppError::List(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::List(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage details stay in the log, never in the response.
        match &self {
            AppError::Internal(e) => tracing::error!(error = %e, "internal server error"),
            AppError::List(e) => tracing::error!(error = ?e, "list query failed"),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
