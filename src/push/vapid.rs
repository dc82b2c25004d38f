//! VAPID (RFC 8292) application server identification.
//!
//! Keys use the same encoding as the `web-push` tooling that generates them:
//! an uncompressed P-256 public point and a raw 32-byte private scalar, both
//! base64url without padding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::{elliptic_curve::sec1::ToEncodedPoint, pkcs8::EncodePrivateKey, SecretKey};
use serde::Serialize;
use thiserror::Error;

/// Push services reject tokens that expire more than 24h out.
const TOKEN_LIFETIME_HOURS: i64 = 12;

#[derive(Debug, Error)]
pub enum VapidError {
    #[error("key is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("private key is not a valid P-256 scalar")]
    InvalidPrivateKey,

    #[error("public key does not match the private key")]
    PublicKeyMismatch,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize)]
struct VapidClaims<'a> {
    aud: &'a str,
    exp: i64,
    sub: &'a str,
}

/// Decodes base64url, tolerating padding and the standard alphabet.
pub fn decode_base64url(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = value
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD.decode(normalized)
}

#[derive(Clone)]
pub struct VapidSigner {
    encoding_key: EncodingKey,
    public_key: String,
    subject: String,
}

impl VapidSigner {
    pub fn from_base64(
        public_key: &str,
        private_key: &str,
        subject: impl Into<String>,
    ) -> Result<Self, VapidError> {
        let scalar = decode_base64url(private_key)?;
        let secret = SecretKey::from_slice(&scalar).map_err(|_| VapidError::InvalidPrivateKey)?;

        let derived = secret.public_key().to_encoded_point(false);
        if decode_base64url(public_key)? != derived.as_bytes() {
            return Err(VapidError::PublicKeyMismatch);
        }

        let der = secret
            .to_pkcs8_der()
            .map_err(|_| VapidError::InvalidPrivateKey)?;

        Ok(Self {
            encoding_key: EncodingKey::from_ec_der(der.as_bytes()),
            public_key: URL_SAFE_NO_PAD.encode(derived.as_bytes()),
            subject: subject.into(),
        })
    }

    /// Application server public key, base64url. Clients pass it as
    /// `applicationServerKey` when subscribing.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// `Authorization` header value for a push service at `audience`
    /// (scheme + host of the endpoint).
    pub fn authorization(&self, audience: &str, now: DateTime<Utc>) -> Result<String, VapidError> {
        let claims = VapidClaims {
            aud: audience,
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            sub: &self.subject,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.encoding_key)?;

        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}
