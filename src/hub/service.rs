//! Service-side hub client
//!
//! Used by the management tool: lists registered devices and pushes
//! device-bound command messages. Authenticates with a named service key.

use std::time::Duration;

use reqwest::header;
use serde::Deserialize;

use crate::command::CommandMessage;
use crate::config::ConnectionString;
use crate::hub::sas::SasSigner;
use crate::hub::HubError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Device listings are bounded; the hub never returns more than this.
const MAX_DEVICE_LIST: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceEntry {
    device_id: String,
}

/// HTTP client holding hub-level (not device-level) credentials.
pub struct ServiceClient {
    http: reqwest::Client,
    host: String,
    signer: SasSigner,
}

impl ServiceClient {
    pub fn new(conn: &ConnectionString) -> Result<Self, HubError> {
        let key_name = conn.key_name.clone().ok_or_else(|| {
            HubError::Credential("connection string has no SharedAccessKeyName".to_string())
        })?;
        let signer = SasSigner::new(&conn.shared_access_key, Some(key_name))?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            host: conn.host_name.clone(),
            signer,
        })
    }

    /// List registered device ids, most-recently-registered first.
    pub async fn list_devices(&self) -> Result<Vec<String>, HubError> {
        let url = format!("https://{}/devices?top={}", self.host, MAX_DEVICE_LIST);
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.signer.token(&self.host)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HubError::Status(response.status()));
        }
        let entries = response
            .json::<Vec<DeviceEntry>>()
            .await
            .map_err(|e| HubError::Body(e.to_string()))?;
        Ok(entries.into_iter().map(|entry| entry.device_id).collect())
    }

    /// Push one command message to a device's queue.
    pub async fn send_command(
        &self,
        device_id: &str,
        command: &CommandMessage,
    ) -> Result<(), HubError> {
        let url = format!(
            "https://{}/devices/{}/messages/devicebound",
            self.host, device_id
        );
        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, self.signer.token(&self.host)?)
            .json(command)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HubError::Status(response.status()));
        }
        Ok(())
    }
}
