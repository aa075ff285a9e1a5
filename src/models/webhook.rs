use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant-registered outbound webhook endpoint. `secret_key` signs every
/// delivery to this registration.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WebhookRegistration {
    pub id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    pub secret_key: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
