use sqlx::PgConnection;

use crate::models::WebhookRegistration;

pub async fn insert(
    conn: &mut PgConnection,
    url: &str,
    events: &[String],
    secret_key: &str,
) -> Result<WebhookRegistration, sqlx::Error> {
    sqlx::query_as::<_, WebhookRegistration>(
        "INSERT INTO webhooks (url, events, secret_key)
         VALUES ($1, $2, $3)
         RETURNING id, url, events, secret_key, active, created_at",
    )
    .bind(url)
    .bind(events)
    .bind(secret_key)
    .fetch_one(conn)
    .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<WebhookRegistration>, sqlx::Error> {
    sqlx::query_as::<_, WebhookRegistration>(
        "SELECT id, url, events, secret_key, active, created_at FROM webhooks ORDER BY created_at",
    )
    .fetch_all(conn)
    .await
}

/// Delivery target: endpoint plus its signing secret.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Target {
    pub url: String,
    pub secret_key: String,
}

pub async fn active_targets(
    conn: &mut PgConnection,
    event_type: &str,
) -> Result<Vec<Target>, sqlx::Error> {
    sqlx::query_as::<_, Target>(
        "SELECT url, secret_key FROM webhooks WHERE active = true AND $1 = ANY(events)",
    )
    .bind(event_type)
    .fetch_all(conn)
    .await
}
