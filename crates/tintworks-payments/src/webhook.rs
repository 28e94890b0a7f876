//! Payment-event signature verification and decoding.
//!
//! The processor signs each delivery with a `Stripe-Signature` header of the
//! form `t=<unix>,v1=<hex hmac>`, where the HMAC-SHA256 is computed over
//! `"{t}.{raw body}"` with the shared endpoint secret. Verification fails
//! closed: a missing, malformed, mismatched, or stale signature rejects the
//! request before any payload parsing happens.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use tintworks_core::error::{Result, TintworksError};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signature timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// A decoded payment event. Closed set: every kind we act on has a variant,
/// everything else lands in `Unhandled` and is acknowledged without effect.
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    CheckoutSessionCompleted(CheckoutSessionCompleted),
    Unhandled { event_type: String, id: String },
}

/// Fields consumed from a completed checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionCompleted {
    /// The checkout session id (`cs_...`).
    pub id: String,
    /// The buyer's user id, set at session creation.
    pub client_reference_id: Option<String>,
    pub payment_intent: Option<String>,
    /// Total in the currency's minor unit (cents).
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct RawSession {
    id: String,
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    payment_intent: Option<Expandable>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    customer_details: Option<RawCustomerDetails>,
}

#[derive(Deserialize)]
struct RawCustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

/// A reference the processor may deliver either as a bare id or as an
/// embedded object carrying one.
#[derive(Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

/// Verify a delivery against the current clock and decode it.
pub fn verify_event(payload: &str, signature_header: &str, secret: &str) -> Result<PaymentEvent> {
    verify_event_at(
        payload,
        signature_header,
        secret,
        chrono::Utc::now().timestamp(),
    )
}

/// Verification against an explicit clock. Split out so tests are
/// deterministic.
pub fn verify_event_at(
    payload: &str,
    signature_header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<PaymentEvent> {
    let (timestamp, provided) = parse_signature_header(signature_header)?;

    let age = now_unix - timestamp;
    if age.abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(TintworksError::SignatureVerification(format!(
            "Timestamp outside tolerance ({age}s old)"
        )));
    }

    let expected = compute_signature(payload, secret, timestamp)?;
    if expected != provided {
        return Err(TintworksError::SignatureVerification(
            "Signature mismatch".into(),
        ));
    }

    decode_event(payload)
}

/// Produce a valid `Stripe-Signature` header value for `payload`. Used by
/// tests and local delivery tooling.
pub fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> String {
    // compute_signature only fails on an empty secret; signing with one is
    // a programming error in test/tooling code.
    let v1 = compute_signature(payload, secret, timestamp)
        .unwrap_or_else(|_| String::from("invalid"));
    format!("t={timestamp},v1={v1}")
}

fn compute_signature(payload: &str, secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TintworksError::SignatureVerification(format!("Bad secret: {e}")))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(format!("{:x}", mac.finalize().into_bytes()))
}

fn parse_signature_header(header: &str) -> Result<(i64, String)> {
    let mut timestamp: Option<i64> = None;
    let mut v1: Option<String> = None;

    for part in header.split(',') {
        if let Some(t) = part.trim().strip_prefix("t=") {
            timestamp = t.parse().ok();
        } else if let Some(sig) = part.trim().strip_prefix("v1=") {
            v1 = Some(sig.to_string());
        }
    }

    match (timestamp, v1) {
        (Some(t), Some(sig)) => Ok((t, sig)),
        _ => Err(TintworksError::SignatureVerification(
            "Malformed signature header".into(),
        )),
    }
}

fn decode_event(payload: &str) -> Result<PaymentEvent> {
    let raw: RawEvent = serde_json::from_str(payload)
        .map_err(|e| TintworksError::SignatureVerification(format!("Invalid event JSON: {e}")))?;

    match raw.kind.as_str() {
        "checkout.session.completed" => {
            let session: RawSession = serde_json::from_value(raw.data.object).map_err(|e| {
                TintworksError::SignatureVerification(format!("Invalid session object: {e}"))
            })?;
            Ok(PaymentEvent::CheckoutSessionCompleted(
                CheckoutSessionCompleted {
                    id: session.id,
                    client_reference_id: session.client_reference_id,
                    payment_intent: session.payment_intent.map(Expandable::into_id),
                    amount_total: session.amount_total,
                    currency: session.currency,
                    customer_email: session.customer_details.and_then(|d| d.email),
                },
            ))
        }
        _ => Ok(PaymentEvent::Unhandled {
            event_type: raw.kind,
            id: raw.id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    fn completed_payload() -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "client_reference_id": "user-42",
                    "payment_intent": "pi_test_1",
                    "amount_total": 20000,
                    "currency": "usd",
                    "customer_details": { "email": "buyer@example.com" }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_sign_then_verify_round_trip() {
        let payload = completed_payload();
        let header = sign_payload(&payload, SECRET, NOW);
        let event = verify_event_at(&payload, &header, SECRET, NOW).unwrap();
        match event {
            PaymentEvent::CheckoutSessionCompleted(session) => {
                assert_eq!(session.id, "cs_test_1");
                assert_eq!(session.client_reference_id.as_deref(), Some("user-42"));
                assert_eq!(session.payment_intent.as_deref(), Some("pi_test_1"));
                assert_eq!(session.amount_total, Some(20000));
                assert_eq!(session.currency.as_deref(), Some("usd"));
                assert_eq!(session.customer_email.as_deref(), Some("buyer@example.com"));
            }
            other => panic!("expected completed session, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = completed_payload();
        let header = sign_payload(&payload, "whsec_other", NOW);
        let err = verify_event_at(&payload, &header, SECRET, NOW).unwrap_err();
        assert!(matches!(err, TintworksError::SignatureVerification(_)));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let payload = completed_payload();
        let header = sign_payload(&payload, SECRET, NOW);
        let tampered = payload.replace("20000", "1");
        assert!(verify_event_at(&tampered, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = completed_payload();
        let old = NOW - SIGNATURE_TOLERANCE_SECS - 1;
        let header = sign_payload(&payload, SECRET, old);
        assert!(verify_event_at(&payload, &header, SECRET, NOW).is_err());
        // Just inside the window is accepted
        let fresh = sign_payload(&payload, SECRET, NOW - SIGNATURE_TOLERANCE_SECS + 1);
        assert!(verify_event_at(&payload, &fresh, SECRET, NOW).is_ok());
    }

    #[test]
    fn test_malformed_header_rejected() {
        let payload = completed_payload();
        for header in ["", "v1=abc", "t=123", "nonsense", "t=abc,v1=def"] {
            assert!(
                verify_event_at(&payload, header, SECRET, NOW).is_err(),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unhandled_event_kind() {
        let payload = serde_json::json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": { "object": {} }
        })
        .to_string();
        let header = sign_payload(&payload, SECRET, NOW);
        match verify_event_at(&payload, &header, SECRET, NOW).unwrap() {
            PaymentEvent::Unhandled { event_type, id } => {
                assert_eq!(event_type, "invoice.paid");
                assert_eq!(id, "evt_2");
            }
            other => panic!("expected unhandled, got {other:?}"),
        }
    }

    #[test]
    fn test_expanded_payment_intent_object() {
        let payload = serde_json::json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_3",
                    "client_reference_id": "user-7",
                    "payment_intent": { "id": "pi_embedded", "status": "succeeded" },
                    "amount_total": 35000,
                    "currency": "usd"
                }
            }
        })
        .to_string();
        let header = sign_payload(&payload, SECRET, NOW);
        match verify_event_at(&payload, &header, SECRET, NOW).unwrap() {
            PaymentEvent::CheckoutSessionCompleted(session) => {
                assert_eq!(session.payment_intent.as_deref(), Some("pi_embedded"));
                assert!(session.customer_email.is_none());
            }
            other => panic!("expected completed session, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_optional_fields_decode() {
        let payload = serde_json::json!({
            "id": "evt_4",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_bare" } }
        })
        .to_string();
        let header = sign_payload(&payload, SECRET, NOW);
        match verify_event_at(&payload, &header, SECRET, NOW).unwrap() {
            PaymentEvent::CheckoutSessionCompleted(session) => {
                assert_eq!(session.id, "cs_bare");
                assert!(session.client_reference_id.is_none());
                assert!(session.payment_intent.is_none());
                assert!(session.amount_total.is_none());
            }
            other => panic!("expected completed session, got {other:?}"),
        }
    }
}
