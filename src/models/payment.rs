use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Two-phase payment states: an authorization is requested (`pending_auth`),
/// confirmed asynchronously by the processor (`authorized`), and captured
/// exactly once at settlement (`captured`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentStatus {
    PendingAuth,
    Authorized,
    Captured,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::PendingAuth => "pending_auth",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Captured => "captured",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// External processor reference (payment intent id). The raw API key
    /// and the client secret are never persisted.
    pub processor_ref: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
