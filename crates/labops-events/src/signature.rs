//! # Webhook Signatures
//!
//! Inbound webhooks from external health-record systems carry an
//! HMAC-SHA256 signature over the raw request body, hex-encoded.
//! Verification is constant-time; a payload is not deserialized into
//! domain types until its signature has been accepted.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature verification failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature is not valid hex of the right length.
    #[error("signature malformed: {0}")]
    Malformed(String),

    /// The signature does not match the payload.
    #[error("signature does not match payload")]
    SignatureInvalid,
}

/// Compute the hex-encoded HMAC-SHA256 signature for a payload.
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Verify a hex-encoded HMAC-SHA256 signature in constant time.
pub fn verify(secret: &[u8], payload: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
    let expected_len = 64; // 32 bytes of SHA-256 output
    let signature_hex = signature_hex.trim().to_lowercase();
    if signature_hex.len() != expected_len {
        return Err(SignatureError::Malformed(format!(
            "signature hex must be {expected_len} chars, got {}",
            signature_hex.len()
        )));
    }
    let bytes = hex_to_bytes(&signature_hex)?;
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&bytes)
        .map_err(|_| SignatureError::SignatureInvalid)
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, SignatureError> {
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| SignatureError::Malformed(format!("invalid hex at offset {i}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"shared-webhook-secret";

    #[test]
    fn test_sign_then_verify() {
        let payload = br#"{"externalSystem":"ehr"}"#;
        let sig = sign(SECRET, payload);
        assert_eq!(sig.len(), 64);
        assert!(verify(SECRET, payload, &sig).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"payload";
        let sig = sign(SECRET, payload);
        assert_eq!(
            verify(b"other-secret", payload, &sig),
            Err(SignatureError::SignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sig = sign(SECRET, b"original");
        assert_eq!(
            verify(SECRET, b"tampered", &sig),
            Err(SignatureError::SignatureInvalid)
        );
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(matches!(
            verify(SECRET, b"p", "deadbeef"),
            Err(SignatureError::Malformed(_))
        ));
        let not_hex = "zz".repeat(32);
        assert!(matches!(
            verify(SECRET, b"p", &not_hex),
            Err(SignatureError::Malformed(_))
        ));
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let payload = b"payload";
        let sig = sign(SECRET, payload).to_uppercase();
        assert!(verify(SECRET, payload, &sig).is_ok());
    }
}
