//! Webhook signature verification.
//!
//! Shopify signs each webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed by the app's shared webhook secret, and sends the digest
//! base64-encoded in the `X-Shopify-Hmac-SHA256` header. Verification MUST
//! run on the raw, unparsed byte stream; re-serializing the JSON first
//! changes the bytes and invalidates the signature.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 digest of the request body.
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Computes the base64-encoded HMAC-SHA256 digest Shopify would send for
/// `body` under `secret`. Exposed for tests and webhook setup tooling.
#[must_use]
pub fn compute_digest(body: &[u8], secret: &str) -> String {
    // Hmac::new_from_slice accepts keys of any length for SHA-256.
    #[allow(clippy::expect_used)]
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Verifies an inbound webhook digest against the raw body and shared secret.
///
/// Returns `false` when the secret is empty or the digests differ. The
/// comparison is constant-time over the encoded digest strings.
#[must_use]
pub fn verify_webhook(raw_body: &[u8], provided_digest: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let expected = compute_digest(raw_body, secret);
    expected.as_bytes().ct_eq(provided_digest.as_bytes()).into()
}
