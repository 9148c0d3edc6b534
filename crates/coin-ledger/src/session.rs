//! Session Tokens
//!
//! End-user identity for the debit path. A token is
//! `"{uid}.{expiry}.{signature}"` where the signature is an HMAC-SHA256
//! over `"{uid}.{expiry}"` with the server's signing key. Authenticated
//! routes derive the caller's uid from a verified token only; client
//! request fields never name the account being mutated.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{LedgerError, Result};
use crate::store::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Verifies (and, for dev/test flows, issues) session tokens
pub struct SessionVerifier {
    signing_key: String,
}

impl SessionVerifier {
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
        }
    }

    /// Issue a token for `uid` valid for `ttl_secs`
    pub fn issue(&self, uid: &UserId, ttl_secs: i64) -> Result<String> {
        let expiry = chrono::Utc::now().timestamp() + ttl_secs;
        let signature = self.sign(uid.as_str(), expiry)?;
        Ok(format!("{uid}.{expiry}.{signature}"))
    }

    /// Verify a token and return the caller's uid
    pub fn verify(&self, token: &str) -> Result<UserId> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<UserId> {
        // rsplitn keeps any dots inside the uid intact
        let mut parts = token.rsplitn(3, '.');
        let (signature, expiry, uid) = match (parts.next(), parts.next(), parts.next()) {
            (Some(sig), Some(exp), Some(uid)) if !uid.is_empty() => (sig, exp, uid),
            _ => return Err(LedgerError::Unauthenticated("malformed session token".into())),
        };

        let expiry_ts: i64 = expiry
            .parse()
            .map_err(|_| LedgerError::Unauthenticated("malformed session token".into()))?;

        let mut mac = self.mac(uid, expiry_ts)?;
        let signature = hex::decode(signature)
            .map_err(|_| LedgerError::Unauthenticated("malformed session token".into()))?;
        mac.verify_slice(&signature)
            .map_err(|_| LedgerError::Unauthenticated("session signature mismatch".into()))?;

        // Expiry is only meaningful once the signature is known good
        if now >= expiry_ts {
            return Err(LedgerError::Unauthenticated("session expired".into()));
        }

        Ok(UserId::from(uid))
    }

    fn sign(&self, uid: &str, expiry: i64) -> Result<String> {
        let mac = self.mac(uid, expiry)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self, uid: &str, expiry: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.as_bytes())
            .map_err(|_| LedgerError::Config("session signing key unusable".into()))?;
        mac.update(uid.as_bytes());
        mac.update(b".");
        mac.update(expiry.to_string().as_bytes());
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> SessionVerifier {
        SessionVerifier::new("test-signing-key")
    }

    #[test]
    fn issued_token_verifies() {
        let v = verifier();
        let token = v.issue(&UserId::from("user-1"), 3600).unwrap();
        assert_eq!(v.verify(&token).unwrap(), UserId::from("user-1"));
    }

    #[test]
    fn tampered_uid_is_rejected() {
        let v = verifier();
        let token = v.issue(&UserId::from("user-1"), 3600).unwrap();
        let forged = token.replacen("user-1", "victim", 1);
        assert!(matches!(
            v.verify(&forged).unwrap_err(),
            LedgerError::Unauthenticated(_)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = verifier().issue(&UserId::from("user-1"), 3600).unwrap();
        assert!(SessionVerifier::new("other-key").verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let v = verifier();
        let token = v.issue(&UserId::from("user-1"), 10).unwrap();
        let far_future = chrono::Utc::now().timestamp() + 11;
        assert!(matches!(
            v.verify_at(&token, far_future).unwrap_err(),
            LedgerError::Unauthenticated(_)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let v = verifier();
        for token in ["", "no-dots", "a.b", "..", "u.notanumber.deadbeef"] {
            assert!(v.verify(token).is_err(), "accepted {token:?}");
        }
    }
}
