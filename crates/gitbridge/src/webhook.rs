//! Webhook payload signature verification.
//!
//! Signatures are HMAC-SHA256 of the raw request body keyed with the shared
//! secret, hex encoded. GitHub prefixes the value with `sha256=`; a bare hex
//! digest is accepted too.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Header GitHub delivers the signature in.
pub const GITHUB_SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Compute the hex signature for `payload`, prefixed with `sha256=`.
#[must_use]
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    let mut mac = new_mac(secret);
    mac.update(payload);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Check `signature` against the HMAC-SHA256 of `payload`.
///
/// The digest comparison is constant-time. Malformed signatures (bad hex,
/// wrong length) and empty secrets simply fail verification.
#[must_use]
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let signature = signature.trim();
    let hex_digest = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or(signature);
    let Ok(expected) = hex::decode(hex_digest) else {
        tracing::debug!("Webhook signature is not valid hex");
        return false;
    };

    let mut mac = new_mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

fn new_mac(secret: &str) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}
