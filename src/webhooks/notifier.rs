use futures::FutureExt;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::json;
use sha2::Sha256;
use tokio::sync::mpsc;

use crate::db::TenantDb;
use crate::error::AppError;
use crate::repository::webhooks;
use crate::tenant::SchemaName;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "X-Rental-Signature";
const QUEUE_DEPTH: usize = 256;

/// Generates a registration signing secret: 32 random bytes, hex-encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex HMAC-SHA256 of the exact body bytes under the registration secret.
pub fn sign_body(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

struct Notification {
    tenant: SchemaName,
    event_type: String,
    payload: serde_json::Value,
}

/// Hands state-transition notifications to a detached worker over a bounded
/// queue. `notify` never blocks and never fails the caller: a full queue is
/// logged and the notification dropped, per the best-effort contract.
///
/// The worker runs with its own background scope, so delivery survives the
/// originating request's cancellation and its failures stay out of the
/// request's error path.
#[derive(Clone)]
pub struct WebhookNotifier {
    tx: mpsc::Sender<Notification>,
}

impl WebhookNotifier {
    pub fn spawn(db: TenantDb, http: reqwest::Client) -> Self {
        let (tx, mut rx) = mpsc::channel::<Notification>(QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if let Err(e) = deliver(&db, &http, &notification).await {
                    tracing::error!(
                        "Error dispatching webhooks for tenant {}: {}",
                        notification.tenant,
                        e
                    );
                }
            }
        });
        Self { tx }
    }

    pub fn notify(&self, tenant: &SchemaName, event_type: &str, payload: serde_json::Value) {
        let notification = Notification {
            tenant: tenant.clone(),
            event_type: event_type.to_string(),
            payload,
        };
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!("Dropping webhook notification: {}", e);
        }
    }
}

async fn deliver(
    db: &TenantDb,
    http: &reqwest::Client,
    notification: &Notification,
) -> Result<(), AppError> {
    let event_type = notification.event_type.clone();
    let targets = db
        .run_scoped(&notification.tenant, move |conn| {
            async move { Ok(webhooks::active_targets(conn, &event_type).await?) }.boxed()
        })
        .await?;

    let body = serde_json::to_vec(&json!({
        "event": notification.event_type,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "data": notification.payload,
    }))?;

    for target in targets {
        send(http, &target.url, &target.secret_key, &body).await;
    }
    Ok(())
}

/// One attempt, failures logged. Not part of the correctness contract.
async fn send(http: &reqwest::Client, url: &str, secret: &str, body: &[u8]) {
    let Some(signature) = sign_body(secret, body) else {
        tracing::error!("Error signing webhook body for {}", url);
        return;
    };

    let result = http
        .post(url)
        .header("Content-Type", "application/json")
        .header("User-Agent", "RentalSaaS-Webhook/1.0")
        .header(SIGNATURE_HEADER, signature)
        .body(body.to_vec())
        .send()
        .await;

    match result {
        Ok(response) if response.status().as_u16() >= 300 => {
            tracing::warn!("Webhook to {} failed with status: {}", url, response.status());
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("Error sending webhook to {}: {}", url, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_64_hex_chars_and_unique() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn body_signature_is_stable_and_keyed() {
        let body = br#"{"event":"booking.created"}"#;
        let sig = sign_body("secret_a", body).unwrap();
        assert_eq!(sign_body("secret_a", body).unwrap(), sig);
        assert_ne!(sign_body("secret_b", body).unwrap(), sig);
        assert_ne!(sign_body("secret_a", b"{}").unwrap(), sig);
    }
}
