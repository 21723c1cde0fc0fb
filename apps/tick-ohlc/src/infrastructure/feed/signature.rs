//! Webhook Signature Verification
//!
//! The feed signs each delivery with HMAC-SHA256 over the exact raw body
//! using a shared secret and sends the base64 digest in the
//! `X-Antenny-Sig` header. Verification happens before the body is parsed.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-antenny-sig";

/// Shared secret for webhook signatures.
#[derive(Clone)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wrap a secret value.
    #[must_use]
    pub const fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Get the secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the secret is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret([REDACTED])")
    }
}

/// Reasons a delivery fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signature header was sent.
    #[error("no signature")]
    MissingSignature,

    /// The request had no body to verify.
    #[error("no body included")]
    MissingBody,

    /// The signature does not match the body.
    #[error("bad signature")]
    Mismatch,

    /// The secret could not key the MAC.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Verifies webhook signatures against a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    keyed: HmacSha256,
}

impl SignatureVerifier {
    /// Create a verifier keyed with `secret`.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidKey` if the MAC rejects the key.
    pub fn new(secret: &WebhookSecret) -> Result<Self, SignatureError> {
        let keyed =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self { keyed })
    }

    /// Base64 HMAC-SHA256 of `body`.
    #[must_use]
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.keyed.clone();
        mac.update(body);
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Check `signature` against `body`.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError` if the signature or body is missing, or if
    /// the signature does not match.
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let result = self.check(signature, body);
        if let Err(ref reason) = result {
            tracing::warn!(reason = %reason, "Webhook signature rejected");
        }
        result
    }

    fn check(&self, signature: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::MissingSignature)?;
        if body.is_empty() {
            return Err(SignatureError::MissingBody);
        }

        let expected = general_purpose::STANDARD
            .decode(signature)
            .map_err(|_| SignatureError::Mismatch)?;

        let mut mac = self.keyed.clone();
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(&WebhookSecret::new("shh".to_string())).unwrap()
    }

    #[test]
    fn matches_reference_digest() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let v = SignatureVerifier::new(&WebhookSecret::new("key".to_string())).unwrap();
        assert_eq!(
            v.sign(b"The quick brown fox jumps over the lazy dog"),
            "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg="
        );
    }

    #[test]
    fn accepts_signature_over_unmodified_body() {
        let v = verifier();
        let body = br#"{"event":"received","message":"{}"}"#;
        let sig = v.sign(body);
        assert_eq!(v.verify(Some(&sig), body), Ok(()));
    }

    #[test]
    fn any_flipped_byte_invalidates() {
        let v = verifier();
        let body = br#"{"event":"received","message":"{}"}"#.to_vec();
        let sig = v.sign(&body);

        for i in 0..body.len() {
            let mut tampered = body.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                v.verify(Some(&sig), &tampered),
                Err(SignatureError::Mismatch),
                "byte {i} flip was accepted"
            );
        }
    }

    #[test]
    fn missing_signature_or_body_rejects() {
        let v = verifier();
        let sig = v.sign(b"x");
        assert_eq!(v.verify(None, b"x"), Err(SignatureError::MissingSignature));
        assert_eq!(v.verify(Some(""), b"x"), Err(SignatureError::MissingSignature));
        assert_eq!(v.verify(Some(&sig), b""), Err(SignatureError::MissingBody));
    }

    #[test]
    fn garbage_signature_rejects() {
        let v = verifier();
        assert_eq!(v.verify(Some("%%%"), b"x"), Err(SignatureError::Mismatch));
        assert_eq!(v.verify(Some("AAAA"), b"x"), Err(SignatureError::Mismatch));
    }

    #[test]
    fn different_secret_rejects() {
        let other = SignatureVerifier::new(&WebhookSecret::new("other".to_string())).unwrap();
        let sig = other.sign(b"payload");
        assert_eq!(
            verifier().verify(Some(&sig), b"payload"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn secret_is_redacted() {
        let debug = format!("{:?}", WebhookSecret::new("hunter2".to_string()));
        assert!(!debug.contains("hunter2"));
    }
}
