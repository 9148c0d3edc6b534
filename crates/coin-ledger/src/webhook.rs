//! Stripe Webhook Verification
//!
//! Validates inbound payment-processor callbacks before any business logic
//! runs. The signature is an HMAC-SHA256 over `"{timestamp}.{raw body}"`
//! with the shared webhook secret, delivered in a `t=...,v1=...` header.
//! Verification runs over the exact bytes received; the payload is only
//! parsed after the signature checks out, because re-serialized JSON is not
//! guaranteed byte-identical.
//!
//! The event payload is modeled as a strict schema rather than ad-hoc
//! nested lookups: a parse failure is a named error, never a silent
//! default.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{LedgerError, Result};
use crate::store::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the processor signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted skew between the signature timestamp and now
const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// The only event type that triggers a credit
const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Verified, parsed webhook event envelope
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentEvent {
    /// Processor-assigned event id (used for idempotent settlement)
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// The `{uid, coinAmount}` pair recovered from a settled payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinGrant {
    pub uid: UserId,
    pub coins: u64,
}

impl PaymentEvent {
    pub fn is_payment_succeeded(&self) -> bool {
        self.event_type == PAYMENT_SUCCEEDED
    }

    /// Extract the coin grant from event metadata.
    pub fn coin_grant(&self) -> Result<CoinGrant> {
        self.data.object.coin_grant()
    }
}

impl EventObject {
    /// Extract the `{uid, coinAmount}` grant from object metadata.
    ///
    /// `coinAmount` arrives as a numeric string (Stripe metadata values are
    /// strings) but a plain number is tolerated too. Missing or non-positive
    /// values are a parse error, not a default.
    pub fn coin_grant(&self) -> Result<CoinGrant> {
        let metadata = &self.metadata;

        let uid = metadata
            .get("uid")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                LedgerError::WebhookParse("Missing required metadata (uid or coinAmount)".into())
            })?;

        let coins = metadata
            .get("coinAmount")
            .and_then(|v| match v {
                serde_json::Value::String(s) => s.parse::<u64>().ok(),
                serde_json::Value::Number(n) => n.as_u64(),
                _ => None,
            })
            .filter(|c| *c > 0)
            .ok_or_else(|| {
                LedgerError::WebhookParse("Missing required metadata (uid or coinAmount)".into())
            })?;

        Ok(CoinGrant {
            uid: UserId::from(uid),
            coins,
        })
    }
}

/// Verifies webhook signatures against the shared secret
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Verify the signature over `payload` and parse the event.
    ///
    /// `payload` must be the raw request body bytes, untouched by any JSON
    /// round-trip.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    fn verify_at(&self, payload: &[u8], signature_header: &str, now: i64) -> Result<PaymentEvent> {
        // Header format: t=timestamp,v1=signature[,v1=...]
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", v)) => timestamp = Some(v),
                Some(("v1", v)) => signatures.push(v),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| LedgerError::WebhookSignature("missing timestamp".into()))?;
        if signatures.is_empty() {
            return Err(LedgerError::WebhookSignature("missing v1 signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| LedgerError::WebhookSignature("invalid timestamp".into()))?;
        if (now - ts).abs() > self.tolerance_secs {
            return Err(LedgerError::WebhookSignature("timestamp outside tolerance".into()));
        }

        let mac = self.signed_payload_mac(timestamp.as_bytes(), payload)?;
        let verified = signatures.iter().any(|sig_hex| {
            hex::decode(sig_hex)
                .is_ok_and(|sig| mac.clone().verify_slice(&sig).is_ok())
        });
        if !verified {
            return Err(LedgerError::WebhookSignature("no matching v1 signature".into()));
        }

        serde_json::from_slice(payload)
            .map_err(|e| LedgerError::WebhookParse(format!("event schema mismatch: {e}")))
    }

    fn signed_payload_mac(&self, timestamp: &[u8], payload: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| LedgerError::Config("webhook secret unusable as HMAC key".into()))?;
        mac.update(timestamp);
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

/// Compute a `t=...,v1=...` header value for `payload`.
///
/// This is the sending side of the scheme; the server only needs it in
/// tests and local tooling that replays webhooks.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn event_json(event_type: &str, metadata: serde_json::Value) -> Vec<u8> {
        serde_json::json!({
            "id": "evt_123",
            "type": event_type,
            "data": { "object": { "metadata": metadata } }
        })
        .to_string()
        .into_bytes()
    }

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SECRET)
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = event_json(
            "payment_intent.succeeded",
            serde_json::json!({"uid": "u1", "coinAmount": "3000"}),
        );
        let header = signature_header(SECRET, 1_700_000_000, &payload);

        let event = verifier()
            .verify_at(&payload, &header, 1_700_000_000)
            .unwrap();
        assert!(event.is_payment_succeeded());
        assert_eq!(event.id, "evt_123");
        assert_eq!(
            event.coin_grant().unwrap(),
            CoinGrant {
                uid: UserId::from("u1"),
                coins: 3000
            }
        );
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = event_json(
            "payment_intent.succeeded",
            serde_json::json!({"uid": "u1", "coinAmount": "3000"}),
        );
        let header = signature_header(SECRET, 1_700_000_000, &payload);

        // Flip one byte: 3000 coins becomes 9000.
        let tampered = String::from_utf8(payload).unwrap().replace("3000", "9000");

        let err = verifier()
            .verify_at(tampered.as_bytes(), &header, 1_700_000_000)
            .unwrap_err();
        assert!(matches!(err, LedgerError::WebhookSignature(_)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = event_json("payment_intent.succeeded", serde_json::json!({}));
        let header = signature_header("whsec_other", 1_700_000_000, &payload);

        assert!(verifier()
            .verify_at(&payload, &header, 1_700_000_000)
            .is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        let payload = event_json("payment_intent.succeeded", serde_json::json!({}));

        assert!(verifier().verify_at(&payload, "", 0).is_err());
        assert!(verifier().verify_at(&payload, "t=123", 123).is_err());
        assert!(verifier().verify_at(&payload, "v1=deadbeef", 0).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = event_json("payment_intent.succeeded", serde_json::json!({}));
        let header = signature_header(SECRET, 1_700_000_000, &payload);

        let err = verifier()
            .verify_at(&payload, &header, 1_700_000_000 + 301)
            .unwrap_err();
        assert!(matches!(err, LedgerError::WebhookSignature(_)));
    }

    #[test]
    fn grant_accepts_numeric_metadata() {
        let payload = event_json(
            "payment_intent.succeeded",
            serde_json::json!({"uid": "u1", "coinAmount": 380}),
        );
        let event: PaymentEvent = serde_json::from_slice(&payload).unwrap();
        assert_eq!(event.coin_grant().unwrap().coins, 380);
    }

    #[test]
    fn grant_requires_uid_and_amount() {
        for metadata in [
            serde_json::json!({}),
            serde_json::json!({"uid": "u1"}),
            serde_json::json!({"coinAmount": "100"}),
            serde_json::json!({"uid": "", "coinAmount": "100"}),
            serde_json::json!({"uid": "u1", "coinAmount": "0"}),
            serde_json::json!({"uid": "u1", "coinAmount": "lots"}),
        ] {
            let payload = event_json("payment_intent.succeeded", metadata);
            let event: PaymentEvent = serde_json::from_slice(&payload).unwrap();
            assert!(matches!(
                event.coin_grant().unwrap_err(),
                LedgerError::WebhookParse(_)
            ));
        }
    }

    #[test]
    fn irrelevant_event_types_parse_but_are_not_actionable() {
        let payload = event_json("charge.refunded", serde_json::json!({}));
        let header = signature_header(SECRET, 0, &payload);
        let event = verifier().verify_at(&payload, &header, 0).unwrap();
        assert!(!event.is_payment_succeeded());
    }
}
