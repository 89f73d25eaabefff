//! Verification protocol for inbound escrow notifications.
//!
//! The sender signs each notification with `hex(HMAC-SHA256(key = client secret, msg = every field
//! except `signature`, concatenated in declared order))`. Verification is mandatory: an event whose
//! signature does not match is rejected before any order resolution happens.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
pub enum CallbackSignatureError {
    #[error("The callback signature does not match the payload")]
    Mismatch,
    #[error("The callback signature is not valid hex: {0}")]
    MalformedSignature(String),
}

/// The expected signature over the given fields, hex-encoded. Exposed so tests (and outbound tooling)
/// can produce valid signatures.
pub fn callback_digest(client_secret: &str, fields: &[&str]) -> String {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    for field in fields {
        mac.update(field.as_bytes());
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex-encoded signature over the concatenated fields.
pub fn verify_callback_signature(
    client_secret: &str,
    fields: &[&str],
    signature: &str,
) -> Result<(), CallbackSignatureError> {
    let provided =
        hex::decode(signature).map_err(|e| CallbackSignatureError::MalformedSignature(e.to_string()))?;
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    for field in fields {
        mac.update(field.as_bytes());
    }
    mac.verify_slice(&provided).map_err(|_| CallbackSignatureError::Mismatch)
}
