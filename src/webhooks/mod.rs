//! Outbound webhook notifications: best-effort, single attempt, signed,
//! delivered off the request path after the triggering transaction has
//! committed.

mod notifier;

pub use notifier::{WebhookNotifier, generate_secret, sign_body};
