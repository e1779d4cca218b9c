//! Webhook delivery signatures.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body, keyed by
//! the webhook secret, and sends it as `sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Header naming the event type of a delivery.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

const ALGORITHM_PREFIX: &str = "sha256=";

fn mac(secret: &str, body: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Computes the signature header value for `body`.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    mac(secret, body).map(|digest| format!("{ALGORITHM_PREFIX}{}", hex::encode(digest)))
}

/// Checks a delivery's signature header against its body.
///
/// A missing header, an unknown algorithm prefix or a value that is not hex
/// all fail verification.
#[must_use]
pub fn verify_signature(secret: &str, header: Option<&str>, body: &[u8]) -> bool {
    let Some(header) = header else {
        return false;
    };
    let Some(provided) = header
        .strip_prefix(ALGORITHM_PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
    else {
        return false;
    };
    let Some(expected) = mac(secret, body) else {
        return false;
    };

    if provided.len() != expected.len() {
        return false;
    }
    expected.ct_eq(&provided).into()
}
