//! Signed, time-limited PIN-change tokens.
//!
//! A token has three dot-separated segments, each URL-safe base64 without
//! padding:
//!
//! ```text
//! payload.timestamp.signature
//! ```
//!
//! The payload is the JSON-encoded user id, and the timestamp is the issuance
//! time in seconds since the Unix epoch, as big-endian bytes with leading
//! zeroes stripped. The signature is an HMAC-SHA256 of `payload.timestamp`,
//! keyed by a SHA-256 hash of the salt and the configured secret, so that
//! tokens cannot be replayed against another scheme sharing the same secret.
//!
//! Tokens are stateless: nothing is stored when they are issued, and they
//! cannot be revoked before they expire.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::{
    config::TokenConfig,
    errors::TokenError,
    secret::Secret,
};

type HmacSha256 = Hmac<Sha256>;

/// The domain-separation salt for PIN-change tokens.
pub const SALT: &str = "pin-change";

const SEPARATOR: char = '.';

/// Issues and verifies PIN-change tokens. Construct this once at startup, and
/// share it by reference; it holds no mutable state, so `issue` and `verify`
/// may be called concurrently from any number of threads.
#[derive(Clone)]
pub struct PinTokens {
    mac: HmacSha256,
    max_age: Duration,
}

struct TokenParts<'a> {
    signed: &'a str,
    payload: &'a str,
    timestamp: &'a str,
    signature: &'a str,
}

impl PinTokens {
    pub fn new(config: &TokenConfig) -> Self {
        Self::with_salt(config, SALT)
    }

    fn with_salt(config: &TokenConfig, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b"signer");
        hasher.update(config.secret.expose().as_bytes());

        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        let mac = HmacSha256::new_from_slice(&key)
            .expect("HMAC accepts keys of any length");
        key.zeroize();

        Self {mac, max_age: config.max_age}
    }

    /// The maximum age used by `verify`.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Issues a token for the given user, at the given time. The token is
    /// safe to use in a URL query string or path segment.
    ///
    /// Tokens issued for the same user within the same second are identical.
    pub fn issue<T: Into<i64>>(&self, subject: T, now: SystemTime) -> Secret {
        let subject = Into::<i64>::into(subject);

        // The decimal form of an integer is also its JSON encoding.
        let payload = URL_SAFE_NO_PAD.encode(subject.to_string());
        let timestamp = encode_timestamp(unix_secs(now));

        let signed = format!("{payload}{SEPARATOR}{timestamp}");
        let signature = self.sign(&signed);

        Secret(format!("{signed}{SEPARATOR}{signature}"))
    }

    /// Verifies a token using the configured maximum age, returning the user
    /// id it was issued for.
    pub fn verify<T: TryFrom<i64>>(&self, token: &str, now: SystemTime) -> Result<T, TokenError> {
        self.verify_with_max_age(token, self.max_age, now)
    }

    /// Verifies a token, returning the user id it was issued for. A token
    /// whose age is exactly `max_age` is still valid.
    ///
    /// The signature is checked before anything in the token is decoded, so
    /// a forged timestamp is reported as `BadSignature`, never as
    /// `SignatureExpired`.
    pub fn verify_with_max_age<T: TryFrom<i64>>(
        &self,
        token: &str,
        max_age: Duration,
        now: SystemTime,
    ) -> Result<T, TokenError> {
        let parts = split(token)
            .ok_or(TokenError::MalformedToken)?;

        let expected = self.sign(parts.signed);
        if !constant_time_eq::constant_time_eq(expected.as_bytes(), parts.signature.as_bytes()) {
            return Err(TokenError::BadSignature);
        }

        // The remaining checks only fail for tokens signed with our key but
        // not issued by `issue`, so they are reported as malformed.
        let subject = decode_subject(parts.payload)
            .ok_or(TokenError::MalformedToken)?;
        let issued_at = decode_timestamp(parts.timestamp)
            .ok_or(TokenError::MalformedToken)?;

        // A token from the future can only come from a deployment with a
        // skewed clock; treat it as expired rather than valid indefinitely.
        let age = unix_secs(now)
            .checked_sub(issued_at)
            .ok_or(TokenError::SignatureExpired)?;

        if age > max_age.as_secs() {
            return Err(TokenError::SignatureExpired);
        }

        T::try_from(subject)
            .map_err(|_| TokenError::MalformedToken)
    }

    fn sign(&self, signed: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(signed.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for PinTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinTokens")
            .field("key", &"[SECRET]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Splits a token into its segments, checking only its structure and
/// alphabet.
fn split(token: &str) -> Option<TokenParts<'_>> {
    let (signed, signature) = token.rsplit_once(SEPARATOR)?;
    let (payload, timestamp) = signed.split_once(SEPARATOR)?;

    [payload, timestamp, signature]
        .iter()
        .all(|segment| is_url_safe_base64(segment))
        .then_some(TokenParts {signed, payload, timestamp, signature})
}

fn is_url_safe_base64(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn decode_subject(payload: &str) -> Option<i64> {
    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&json).ok()
}

fn encode_timestamp(secs: u64) -> String {
    let bytes = secs.to_be_bytes();
    let first = bytes.iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    URL_SAFE_NO_PAD.encode(&bytes[first..])
}

fn decode_timestamp(timestamp: &str) -> Option<u64> {
    let bytes = URL_SAFE_NO_PAD.decode(timestamp).ok()?;
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Seconds since the Unix epoch. A clock set before the epoch counts as the
/// epoch itself.
fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
