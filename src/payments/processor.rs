use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processor request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("processor rejected: {0}")]
    Rejected(String),
}

/// A manual-capture authorization held at the external processor.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Processor-side reference (payment intent id); safe to persist.
    pub processor_ref: String,
    /// Client-usable handle for completing the authorization; never
    /// persisted.
    pub client_secret: String,
}

/// Attached to every authorization so asynchronous processor events can be
/// routed back to the right tenant partition without trusting the caller.
#[derive(Debug, Clone)]
pub struct AuthorizationMetadata {
    pub tenant_id: String,
    pub booking_id: Uuid,
}

/// Port to the external payment processor. Two-phase: authorizations are
/// created with manual capture, and captured exactly once at settlement.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_authorization(
        &self,
        amount_cents: i64,
        metadata: &AuthorizationMetadata,
    ) -> Result<Authorization, ProcessorError>;

    /// Fetches the client handle of an existing authorization. The handle
    /// is not stored locally, so idempotent re-entry of intent creation
    /// re-reads it from the processor.
    async fn retrieve_client_secret(&self, processor_ref: &str) -> Result<String, ProcessorError>;

    /// Captures up to `amount_cents` of the authorization. Re-capture with
    /// the same idempotency key must be a safe no-op on the processor side;
    /// a failure propagates so the enclosing transaction aborts.
    async fn capture(
        &self,
        processor_ref: &str,
        amount_cents: i64,
        idempotency_key: &str,
    ) -> Result<(), ProcessorError>;
}

/// Stripe payment-intents implementation.
pub struct StripeProcessor {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripeProcessor {
    pub fn new(http: reqwest::Client, base_url: String, secret_key: String) -> Self {
        Self { http, base_url, secret_key }
    }

    async fn parse_intent(response: reqwest::Response) -> Result<IntentResponse, ProcessorError> {
        if response.status().is_success() {
            Ok(response.json::<IntentResponse>().await?)
        } else {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(ProcessorError::Rejected(message))
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_authorization(
        &self,
        amount_cents: i64,
        metadata: &AuthorizationMetadata,
    ) -> Result<Authorization, ProcessorError> {
        let amount = amount_cents.to_string();
        let booking_id = metadata.booking_id.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", "usd"),
            ("capture_method", "manual"),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[tenant_id]", metadata.tenant_id.as_str()),
            ("metadata[booking_id]", booking_id.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let intent = Self::parse_intent(response).await?;
        let client_secret = intent
            .client_secret
            .ok_or_else(|| ProcessorError::Rejected("intent has no client secret".to_string()))?;
        Ok(Authorization { processor_ref: intent.id, client_secret })
    }

    async fn retrieve_client_secret(&self, processor_ref: &str) -> Result<String, ProcessorError> {
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{processor_ref}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let intent = Self::parse_intent(response).await?;
        intent
            .client_secret
            .ok_or_else(|| ProcessorError::Rejected("intent has no client secret".to_string()))
    }

    async fn capture(
        &self,
        processor_ref: &str,
        amount_cents: i64,
        idempotency_key: &str,
    ) -> Result<(), ProcessorError> {
        let amount = amount_cents.to_string();
        let response = self
            .http
            .post(format!("{}/v1/payment_intents/{processor_ref}/capture", self.base_url))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", idempotency_key)
            .form(&[("amount_to_capture", amount.as_str())])
            .send()
            .await?;

        Self::parse_intent(response).await?;
        Ok(())
    }
}

/// In-memory processor for development and tests. Keeps a per-key charge
/// ledger so a re-capture with the same idempotency key does not charge
/// again, mirroring the real processor's contract.
#[derive(Default)]
pub struct MockProcessor {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    next_intent: u64,
    /// idempotency key -> captured amount
    captures: HashMap<String, i64>,
    charge_count: u64,
    fail_next_capture: bool,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of distinct charges made (re-captures with a seen key do not
    /// count).
    pub fn charge_count(&self) -> u64 {
        self.state.lock().expect("mock processor poisoned").charge_count
    }

    /// Makes the next capture fail once, simulating a transient processor
    /// outage.
    pub fn fail_next_capture(&self) {
        self.state.lock().expect("mock processor poisoned").fail_next_capture = true;
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_authorization(
        &self,
        _amount_cents: i64,
        metadata: &AuthorizationMetadata,
    ) -> Result<Authorization, ProcessorError> {
        let mut state = self.state.lock().expect("mock processor poisoned");
        state.next_intent += 1;
        let processor_ref = format!("pi_mock_{}_{}", metadata.booking_id.simple(), state.next_intent);
        tracing::info!("Mock authorization created: {}", processor_ref);
        Ok(Authorization {
            client_secret: format!("{processor_ref}_secret"),
            processor_ref,
        })
    }

    async fn retrieve_client_secret(&self, processor_ref: &str) -> Result<String, ProcessorError> {
        Ok(format!("{processor_ref}_secret"))
    }

    async fn capture(
        &self,
        processor_ref: &str,
        amount_cents: i64,
        idempotency_key: &str,
    ) -> Result<(), ProcessorError> {
        let mut state = self.state.lock().expect("mock processor poisoned");
        if state.fail_next_capture {
            state.fail_next_capture = false;
            return Err(ProcessorError::Rejected("simulated capture failure".to_string()));
        }
        if state.captures.contains_key(idempotency_key) {
            tracing::info!("Mock capture replayed for key {}, no-op", idempotency_key);
            return Ok(());
        }
        state.captures.insert(idempotency_key.to_string(), amount_cents);
        state.charge_count += 1;
        tracing::info!("Mock capture of {} on {}", amount_cents, processor_ref);
        Ok(())
    }
}
