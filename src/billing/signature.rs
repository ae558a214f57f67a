use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted clock skew between the signature timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verifies a `t=<unix>,v1=<hex>` signature header against the raw body.
///
/// The signed message is `<timestamp>.<body>`. Verification uses the MAC's
/// own constant-time comparison; any malformed header, stale timestamp, or
/// mismatched digest is treated the same way.
pub fn verify_signature(secret: &str, header: &str, body: &str) -> Result<()> {
    verify_signature_at(secret, header, body, Utc::now().timestamp())
}

fn verify_signature_at(secret: &str, header: &str, body: &str, now: i64) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut provided: Option<Vec<u8>> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => provided = hex::decode(value).ok(),
            _ => {}
        }
    }

    let (Some(timestamp), Some(provided)) = (timestamp, provided) else {
        return Err(Error::Unauthorized);
    };

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(Error::Unauthorized);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::Unauthorized)?;
    mac.update(format!("{timestamp}.{body}").as_bytes());
    mac.verify_slice(&provided).map_err(|_| Error::Unauthorized)
}
