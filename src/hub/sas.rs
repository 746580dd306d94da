//! Shared-access signature signing
//!
//! Every hub request carries a short-lived token: an HMAC-SHA256 over
//! `<resource>\n<expiry>` with the connection string's shared key, rendered
//! as `SharedAccessSignature sr=<resource>&sig=<base64url>&se=<unix expiry>`
//! (plus `&skn=<name>` for service credentials).

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::hub::HubError;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: i64 = 3600;

/// Signs per-request tokens from a decoded shared access key.
#[derive(Clone)]
pub struct SasSigner {
    key: Vec<u8>,
    key_name: Option<String>,
}

impl SasSigner {
    /// Build a signer from the base64 shared key in a connection string.
    pub fn new(shared_access_key: &str, key_name: Option<String>) -> Result<Self, HubError> {
        let key = STANDARD
            .decode(shared_access_key)
            .map_err(|e| HubError::Credential(format!("shared access key is not base64: {e}")))?;
        if key.is_empty() {
            return Err(HubError::Credential("shared access key is empty".to_string()));
        }
        Ok(Self { key, key_name })
    }

    /// Sign a token for `resource` expiring at the given unix timestamp.
    pub fn token_at(&self, resource: &str, expiry_unix: i64) -> Result<String, HubError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| HubError::Credential(e.to_string()))?;
        mac.update(format!("{resource}\n{expiry_unix}").as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let mut token =
            format!("SharedAccessSignature sr={resource}&sig={sig}&se={expiry_unix}");
        if let Some(name) = &self.key_name {
            token.push_str("&skn=");
            token.push_str(name);
        }
        Ok(token)
    }

    /// Sign a token for `resource` with the standard lifetime from now.
    pub fn token(&self, resource: &str) -> Result<String, HubError> {
        self.token_at(resource, Utc::now().timestamp() + TOKEN_TTL_SECS)
    }
}
