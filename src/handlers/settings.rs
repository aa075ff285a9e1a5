use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::AppState;
use crate::error::AppError;
use crate::models::WebhookRegistration;
use crate::repository::webhooks;
use crate::tenant::TenantSchema;
use crate::webhooks::generate_secret;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks", get(list_webhooks).post(register_webhook))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebhookRequest {
    #[validate(url(message = "url must be a valid URL"))]
    pub url: String,
    #[validate(length(min = 1, message = "at least one event type is required"))]
    pub events: Vec<String>,
}

async fn register_webhook(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Json(req): Json<CreateWebhookRequest>,
) -> Result<(StatusCode, Json<WebhookRegistration>), AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let secret = generate_secret();
    let registration = state
        .db
        .run_scoped(&tenant, move |conn| {
            async move { Ok(webhooks::insert(conn, &req.url, &req.events, &secret).await?) }.boxed()
        })
        .await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

async fn list_webhooks(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
) -> Result<Json<serde_json::Value>, AppError> {
    let registrations = state
        .db
        .run_scoped(&tenant, |conn| async move { Ok(webhooks::list(conn).await?) }.boxed())
        .await?;

    Ok(Json(json!({ "status": "success", "data": registrations })))
}
