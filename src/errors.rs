use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::WorkflowState;
use crate::services::booking_form::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid booking details: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0:#}")]
    Store(anyhow::Error),

    #[error("{0}")]
    PaymentUnavailable(String),

    #[error("payment error: {0}")]
    Payment(String),

    #[error("payment not verified: {0}")]
    PaymentUnverified(String),

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: WorkflowState,
        action: &'static str,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::PaymentUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::PaymentUnverified(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
