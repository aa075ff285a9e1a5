use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::error::AppError;
use crate::payments::signature;
use crate::tenant::TenantSchema;

/// Processor events larger than this are rejected outright.
const MAX_EVENT_BYTES: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new().route("/intent", post(create_intent))
}

/// Inbound surface for the external processor; not tenant-routed: the
/// tenant is carried in the event metadata.
pub fn webhook_router() -> Router<AppState> {
    Router::new()
        .route("/stripe", post(processor_webhook))
        .layer(DefaultBodyLimit::max(MAX_EVENT_BYTES))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentRequest {
    pub booking_id: Uuid,
    /// Amount in cents.
    #[validate(range(min = 1, message = "amount must be greater than 0"))]
    pub amount: i64,
}

async fn create_intent(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let client_secret = state.payments.create_intent(&tenant, req.booking_id, req.amount).await?;
    Ok(Json(json!({ "client_secret": client_secret })))
}

async fn processor_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature_header = headers
        .get(signature::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("missing signature header".to_string()))?;

    state.payments.handle_processor_event(&body, signature_header).await?;
    Ok(StatusCode::OK)
}
