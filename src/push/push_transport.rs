use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;

use super::{
    encryption::{self, EncryptionError},
    push_models::PushPayload,
    vapid::{decode_base64url, VapidError, VapidSigner},
};
use crate::{state::Config, subscription::PushSubscription};

/// How the dispatcher should react to a failed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The push service says the subscription no longer exists. Prune it.
    Gone,
    /// Anything else. Log it and move on.
    Transient,
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push endpoint is gone (HTTP {status})")]
    Gone { status: u16 },

    #[error("push service rejected the notification (HTTP {status})")]
    Rejected { status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid subscription: {0}")]
    InvalidSubscription(String),

    #[error("encryption failed: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("VAPID error: {0}")]
    Vapid(#[from] VapidError),

    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

impl PushError {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => PushError::Gone { status },
            _ => PushError::Rejected { status },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PushError::Gone { .. } => FailureKind::Gone,
            _ => FailureKind::Transient,
        }
    }
}

/// Delivers one payload to one subscription.
///
/// Implementations bound each call with their own timeout.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &PushPayload)
        -> Result<(), PushError>;

    /// Application server key subscriptions must be created with, base64url.
    fn public_key(&self) -> &str;
}

/// Web Push over HTTP: aes128gcm-encrypted body, VAPID authorization.
#[derive(Clone)]
pub struct WebPushTransport {
    client: reqwest::Client,
    signer: VapidSigner,
    ttl_seconds: u32,
}

impl WebPushTransport {
    pub fn new(signer: VapidSigner, ttl_seconds: u32, timeout: Duration) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            signer,
            ttl_seconds,
        })
    }

    /// `None` when either VAPID key is missing; malformed keys are an error.
    pub fn from_config(config: &Config) -> Result<Option<Self>, PushError> {
        let (Some(public_key), Some(private_key)) =
            (&config.vapid_public_key, &config.vapid_private_key)
        else {
            return Ok(None);
        };

        let signer = VapidSigner::from_base64(public_key, private_key, config.vapid_subject.clone())?;
        let transport = Self::new(
            signer,
            config.push_ttl_seconds,
            Duration::from_secs(config.push_timeout_seconds),
        )?;

        Ok(Some(transport))
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        let ua_public = decode_base64url(&subscription.p256dh)
            .map_err(|e| PushError::InvalidSubscription(format!("p256dh: {}", e)))?;
        let auth_secret = decode_base64url(&subscription.auth)
            .map_err(|e| PushError::InvalidSubscription(format!("auth: {}", e)))?;

        let endpoint = reqwest::Url::parse(&subscription.endpoint)
            .map_err(|e| PushError::InvalidSubscription(format!("endpoint: {}", e)))?;
        let audience = endpoint.origin().ascii_serialization();

        let body = encryption::encrypt(&payload.to_bytes()?, &ua_public, &auth_secret)?;
        let authorization = self.signer.authorization(&audience, Utc::now())?;

        let response = self
            .client
            .post(endpoint)
            .header("TTL", self.ttl_seconds.to_string())
            .header(CONTENT_ENCODING, "aes128gcm")
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PushError::from_status(status.as_u16()))
        }
    }

    fn public_key(&self) -> &str {
        self.signer.public_key()
    }
}
