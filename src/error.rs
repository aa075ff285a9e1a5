use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::CarStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    #[error("car cannot go from {from} to {to}")]
    InvalidTransition { from: CarStatus, to: CarStatus },

    #[error("tenant scope error: {0}")]
    TenantScope(String),

    #[error("settlement failed: {0}")]
    Settlement(String),

    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::Validation(msg) => {
                tracing::warn!("Validation error: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, None, msg)
            }
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, None, msg)
            }
            AppError::NotFound(msg) | AppError::TenantNotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, None, msg)
            }
            AppError::InvalidTransition { from, to } => {
                tracing::warn!("Invalid transition: {} -> {}", from, to);
                (
                    StatusCode::BAD_REQUEST,
                    Some("ERR_INVALID_TRANSITION"),
                    format!("Car cannot go from {from} to {to}. Must be inspected first."),
                )
            }
            AppError::TenantScope(msg) => {
                tracing::error!("Tenant scope error: {}", msg);
                // Fails closed: never fall back to an unscoped partition.
                (StatusCode::INTERNAL_SERVER_ERROR, None, msg)
            }
            AppError::Settlement(msg) => {
                tracing::error!("Settlement failed: {}", msg);
                (StatusCode::BAD_GATEWAY, None, msg)
            }
            AppError::Storage(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None, format!("Database error: {}", e))
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, None, format!("Invalid JSON: {}", e))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None, format!("Internal server error: {}", e))
            }
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });
        if let Some(code) = code {
            body["code"] = json!(code);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_409() {
        let resp = AppError::Conflict("car is not available".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_transition_maps_to_400() {
        let resp = AppError::InvalidTransition {
            from: CarStatus::Rented,
            to: CarStatus::Available,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_maps_to_422() {
        let resp = AppError::Validation("damage cost cannot be negative".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
