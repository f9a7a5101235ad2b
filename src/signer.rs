//! Signed links for the password reset flow (HMAC-SHA256).
//!
//! Format: `<url>&ts=<unix seconds>&sig=<lowercase hex mac>`, with `?` in
//! place of the first `&` when the url has no query. The mac covers every
//! byte before `&sig=`.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIG_MARKER: &str = "&sig=";

#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn sign(&self, url: &str) -> String {
        self.sign_at(url, Utc::now())
    }

    pub fn sign_at(&self, url: &str, issued_at: DateTime<Utc>) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        let unsigned = format!("{url}{sep}ts={}", issued_at.timestamp());
        let sig = hex::encode(self.mac(unsigned.as_bytes()).finalize().into_bytes());
        format!("{unsigned}{SIG_MARKER}{sig}")
    }

    /// True when the signature matches the rest of the url.
    pub fn verify(&self, signed: &str) -> bool {
        let Some((unsigned, sig)) = signed.rsplit_once(SIG_MARKER) else {
            return false;
        };
        // hex::decode is case-insensitive; only the canonical form is accepted.
        if sig.is_empty() || !sig.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return false;
        }
        let Ok(expected) = hex::decode(sig) else {
            return false;
        };
        self.mac(unsigned.as_bytes()).verify_slice(&expected).is_ok()
    }

    /// True when the link was issued more than `minutes` ago, or carries no
    /// readable timestamp. Independent of the signature.
    pub fn is_expired(&self, signed: &str, minutes: i64) -> bool {
        is_expired_at(signed, minutes, Utc::now())
    }

    fn mac(&self, data: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(data);
        mac
    }
}

pub fn is_expired_at(signed: &str, minutes: i64, now: DateTime<Utc>) -> bool {
    match issued_at(signed) {
        Some(issued) => now - issued > Duration::minutes(minutes),
        None => true,
    }
}

fn issued_at(signed: &str) -> Option<DateTime<Utc>> {
    let unsigned = signed
        .rsplit_once(SIG_MARKER)
        .map_or(signed, |(unsigned, _)| unsigned);
    let last_param = unsigned.rsplit(['?', '&']).next()?;
    let ts: i64 = last_param.strip_prefix("ts=")?.parse().ok()?;
    DateTime::from_timestamp(ts, 0)
}
