//! API-key authentication for private streams.
//!
//! The hub expects `Authenticate(apiKey, timestamp, randomContent, signature)`
//! where the signature is the hex HMAC-SHA512 of `timestamp + randomContent`
//! keyed with the API secret.

use crate::error::AuthError;
use crate::message::HubResponse;
use crate::transport::HubConnection;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha512;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha512 = Hmac<Sha512>;

/// API key pair. The secret is wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign a fresh challenge using the current time and a random nonce.
    pub fn challenge(&self) -> Result<Challenge, AuthError> {
        let timestamp = Utc::now().timestamp_millis();
        let nonce = Uuid::new_v4().to_string();
        self.challenge_at(timestamp, nonce)
    }

    pub fn challenge_at(&self, timestamp: i64, nonce: String) -> Result<Challenge, AuthError> {
        let signature = sign(&self.api_secret, &format!("{timestamp}{nonce}"))?;
        Ok(Challenge {
            api_key: self.api_key.clone(),
            timestamp,
            nonce,
            signature,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Signed `Authenticate` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub api_key: String,
    pub timestamp: i64,
    pub nonce: String,
    pub signature: String,
}

impl Challenge {
    pub fn into_args(self) -> Vec<Value> {
        vec![
            json!(self.api_key),
            json!(self.timestamp),
            json!(self.nonce),
            json!(self.signature),
        ]
    }
}

/// Hex-encoded HMAC-SHA512 of `message`.
pub fn sign(secret: &str, message: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::InvalidSecret(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Run the `Authenticate` call on an open connection.
pub async fn authenticate<C: HubConnection>(
    connection: &mut C,
    credentials: &Credentials,
) -> Result<(), AuthError> {
    let challenge = credentials.challenge()?;
    debug!(api_key = %challenge.api_key, timestamp = challenge.timestamp, "Authenticating");

    let result = connection
        .invoke("Authenticate", challenge.into_args())
        .await
        .map_err(|e| AuthError::Call(e.to_string()))?;
    let response: HubResponse =
        serde_json::from_value(result).map_err(|e| AuthError::Call(e.to_string()))?;

    if response.success {
        info!("Authenticated");
        Ok(())
    } else {
        let code = response.failure_code();
        warn!(%code, "Authentication rejected");
        Err(AuthError::Rejected(code))
    }
}
