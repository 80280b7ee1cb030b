//! Webhook signature verification.
//!
//! The platform signs `"{timestamp}.{raw body}"` with HMAC-SHA256 and sends
//! `mux-signature: t=<unix seconds>,v1=<hex digest>`. Verification must run
//! over the exact bytes received, never a re-serialized body.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing mux-signature header")]
    MissingHeader,
    #[error("malformed mux-signature header: {0}")]
    MalformedHeader(&'static str),
    #[error("signature timestamp is outside the tolerance window")]
    TimestampOutOfTolerance,
    #[error("no signature matched the request body")]
    Mismatch,
    #[error("webhook secret is not a usable HMAC key")]
    InvalidSecret,
}

/// Parsed `mux-signature` header
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader<'a> {
    timestamp: i64,
    /// `t=` value exactly as sent; this is what was signed
    signed_timestamp: &'a str,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or(SignatureError::MalformedHeader("expected key=value pairs"))?;
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::MalformedHeader("timestamp is not an integer"))?;
                timestamp = Some((t, value));
            }
            // Undecodable candidates can never match; skip rather than fail
            "v1" => {
                if let Ok(sig) = hex::decode(value) {
                    signatures.push(sig);
                }
            }
            _ => {}
        }
    }

    let (timestamp, signed_timestamp) =
        timestamp.ok_or(SignatureError::MalformedHeader("missing t="))?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader("missing v1="));
    }

    Ok(SignatureHeader {
        timestamp,
        signed_timestamp,
        signatures,
    })
}

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Compute the header value the platform would send for `body` at `timestamp`
pub fn sign(body: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let digest = mac_for(secret, &timestamp.to_string(), body)?
        .finalize()
        .into_bytes();
    Ok(format!("t={},v1={}", timestamp, hex::encode(digest)))
}

/// Verify a webhook delivery against the shared secret.
///
/// `now` is unix seconds; the signed timestamp may differ from it by at most
/// `tolerance_secs` in either direction.
pub fn verify(
    body: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
    tolerance_secs: u64,
) -> Result<(), SignatureError> {
    let header = parse_header(header.ok_or(SignatureError::MissingHeader)?)?;

    if now.abs_diff(header.timestamp) > tolerance_secs {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let mac = mac_for(secret, header.signed_timestamp, body)?;
    let matched = header
        .signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
