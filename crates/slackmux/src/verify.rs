//! Slack request signature verification.
//!
//! Slack signs every request with `HMAC-SHA256(signing_secret, "v0:{ts}:{body}")`
//! and sends it as `X-Slack-Signature: v0=<hex>` alongside
//! `X-Slack-Request-Timestamp`. Requests older than five minutes are
//! rejected to limit replay.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::MuxError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Maximum accepted distance between the request timestamp and local time.
const MAX_CLOCK_SKEW_SECS: u64 = 300;

const VERSION: &str = "v0";

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, MuxError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| MuxError::Verification(e.to_string()))?;
    mac.update(format!("{VERSION}:{timestamp}:").as_bytes());
    mac.update(body);
    Ok(mac)
}

/// Computes the `X-Slack-Signature` header value for a request body.
///
/// # Errors
///
/// Returns `MuxError::Verification` if the HMAC cannot be keyed with `secret`.
///
/// # Examples
///
/// ```
/// let sig = slackmux::verify::sign("secret", "1700000000", b"payload=%7B%7D").unwrap();
/// assert!(sig.starts_with("v0="));
/// assert_eq!(sig.len(), 3 + 64);
/// ```
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, MuxError> {
    let mac = mac_for(secret, timestamp, body)?;
    Ok(format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verifies the signature headers of a request against `secret`.
///
/// # Errors
///
/// Returns `MuxError::Verification` if a header is missing or malformed,
/// the timestamp is outside the accepted window around `now`, or the
/// signature does not match.
pub fn verify(
    secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: SystemTime,
) -> Result<(), MuxError> {
    let timestamp = header_str(headers, TIMESTAMP_HEADER)?;
    let signature = header_str(headers, SIGNATURE_HEADER)?;

    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| MuxError::Verification(format!("invalid timestamp {timestamp:?}")))?;
    let now = now
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default();
    if now.abs_diff(sent_at) > MAX_CLOCK_SKEW_SECS {
        return Err(MuxError::Verification("timestamp outside window".into()));
    }

    let digest = signature
        .strip_prefix("v0=")
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or_else(|| MuxError::Verification("malformed signature".into()))?;

    mac_for(secret, timestamp, body)?
        .verify_slice(&digest)
        .map_err(|_| MuxError::Verification("signature mismatch".into()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, MuxError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MuxError::Verification(format!("missing {name} header")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &[u8] = b"payload=%7B%22type%22%3A%22block_actions%22%7D";

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn signed_headers(timestamp: &str, signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TIMESTAMP_HEADER, timestamp.parse().expect("header"));
        headers.insert(SIGNATURE_HEADER, signature.parse().expect("header"));
        headers
    }

    #[test]
    fn test_should_accept_valid_signature() {
        let sig = sign(SECRET, "1700000000", BODY).expect("sign");
        let headers = signed_headers("1700000000", &sig);
        assert!(verify(SECRET, &headers, BODY, at(1_700_000_010)).is_ok());
    }

    #[test]
    fn test_should_reject_tampered_body() {
        let sig = sign(SECRET, "1700000000", BODY).expect("sign");
        let headers = signed_headers("1700000000", &sig);
        let err = verify(SECRET, &headers, b"payload=%7B%7D", at(1_700_000_000)).unwrap_err();
        assert_eq!(err, MuxError::Verification("signature mismatch".into()));
    }

    #[test]
    fn test_should_reject_wrong_secret() {
        let sig = sign("other-secret", "1700000000", BODY).expect("sign");
        let headers = signed_headers("1700000000", &sig);
        assert!(verify(SECRET, &headers, BODY, at(1_700_000_000)).is_err());
    }

    #[test]
    fn test_should_reject_stale_timestamp() {
        let sig = sign(SECRET, "1700000000", BODY).expect("sign");
        let headers = signed_headers("1700000000", &sig);
        let err = verify(SECRET, &headers, BODY, at(1_700_000_600)).unwrap_err();
        assert!(err.to_string().contains("window"));
    }

    #[test]
    fn test_should_reject_future_timestamp() {
        let sig = sign(SECRET, "1700000600", BODY).expect("sign");
        let headers = signed_headers("1700000600", &sig);
        assert!(verify(SECRET, &headers, BODY, at(1_700_000_000)).is_err());
    }

    #[test]
    fn test_should_reject_missing_headers() {
        let err = verify(SECRET, &HeaderMap::new(), BODY, at(1_700_000_000)).unwrap_err();
        assert!(err.to_string().contains(TIMESTAMP_HEADER));
    }

    #[test]
    fn test_should_reject_malformed_signature() {
        let headers = signed_headers("1700000000", "v1=zz");
        let err = verify(SECRET, &headers, BODY, at(1_700_000_000)).unwrap_err();
        assert_eq!(err, MuxError::Verification("malformed signature".into()));
    }

    #[test]
    fn test_should_reject_non_numeric_timestamp() {
        let headers = signed_headers("yesterday", "v0=00");
        let err = verify(SECRET, &headers, BODY, at(1_700_000_000)).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_should_reject_extreme_timestamps() {
        for timestamp in ["-9223372036854775808", "9223372036854775807"] {
            let headers = signed_headers(timestamp, "v0=00");
            let err = verify(SECRET, &headers, BODY, at(1_700_000_000)).unwrap_err();
            assert_eq!(err, MuxError::Verification("timestamp outside window".into()));
        }
    }

    #[test]
    fn test_should_sign_with_empty_secret() {
        let sig = sign("", "1700000000", BODY).expect("sign");
        assert!(sig.starts_with("v0="));
        assert_eq!(sig.len(), 3 + 64);
    }
}
