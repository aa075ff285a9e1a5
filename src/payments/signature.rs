use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the processor's event signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Events older (or further in the future) than this are rejected to bound
/// replay windows.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
}

/// Computes the hex signature over `"{timestamp}.{payload}"`, the scheme
/// the processor uses for its event notifications.
pub fn sign(secret: &[u8], timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a `t=<unix>,v1=<hex>` signature header over the raw payload.
///
/// The comparison is constant-time and every `v1` candidate in the header
/// is tried; the timestamp must be within `DEFAULT_TOLERANCE_SECS` of
/// `now`.
pub fn verify(
    secret: &[u8],
    header: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<String> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?);
            }
            Some(("v1", value)) => candidates.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now.timestamp() - timestamp).abs() > DEFAULT_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    let expected = sign(secret, timestamp, payload)?;
    let expected_bytes = hex::decode(&expected).map_err(|_| SignatureError::Malformed)?;

    for candidate in candidates {
        let Ok(candidate_bytes) = hex::decode(candidate) else {
            continue;
        };
        if candidate_bytes.ct_eq(&expected_bytes).into() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test_secret";
    const PAYLOAD: &[u8] = br#"{"type":"payment_intent.amount_capturable_updated"}"#;

    fn header_for(timestamp: i64) -> String {
        format!("t={},v1={}", timestamp, sign(SECRET, timestamp, PAYLOAD).unwrap())
    }

    #[test]
    fn valid_signature_verifies() {
        let now = Utc::now();
        let header = header_for(now.timestamp());
        assert_eq!(verify(SECRET, &header, PAYLOAD, now), Ok(()));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let now = Utc::now();
        let header = header_for(now.timestamp());
        assert_eq!(
            verify(SECRET, &header, br#"{"type":"forged"}"#, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let header = header_for(now.timestamp());
        assert_eq!(verify(b"other_secret", &header, PAYLOAD, now), Err(SignatureError::Mismatch));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let now = Utc::now();
        let header = header_for(now.timestamp() - DEFAULT_TOLERANCE_SECS - 1);
        assert_eq!(verify(SECRET, &header, PAYLOAD, now), Err(SignatureError::Expired));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let now = Utc::now();
        for header in ["", "v1=abc", "t=notanumber,v1=abc", "t=123"] {
            assert_eq!(verify(SECRET, header, PAYLOAD, now), Err(SignatureError::Malformed), "{header}");
        }
    }

    #[test]
    fn extra_candidates_are_tolerated() {
        let now = Utc::now();
        let t = now.timestamp();
        let header = format!("t={t},v1=deadbeef,v1={}", sign(SECRET, t, PAYLOAD).unwrap());
        assert_eq!(verify(SECRET, &header, PAYLOAD, now), Ok(()));
    }
}
