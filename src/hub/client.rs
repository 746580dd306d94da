//! Device-side hub client
//!
//! Telemetry is a single authenticated POST. File upload is the hub's
//! two-phase flow: request an upload slot, PUT the bytes to the returned
//! blob location, then notify the hub of the outcome so it can release the
//! slot. Commands are fetched by polling the device-bound endpoint.

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};

use crate::command::CommandMessage;
use crate::config::ConnectionString;
use crate::hub::sas::SasSigner;
use crate::hub::{DeviceTransport, HubError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall budget for the three-phase upload flow.
const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Upload slot returned by the hub for a requested blob name.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSlot {
    pub correlation_id: String,
    pub host_name: String,
    pub container_name: String,
    pub blob_name: String,
    pub sas_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadNotification<'a> {
    correlation_id: &'a str,
    is_success: bool,
    status_code: u16,
    status_description: &'a str,
}

/// Destination name for an uploaded file: `<device>_<YYYYMMDDHHMMSS>_<name>`.
pub fn destination_blob_name(device_id: &str, now: DateTime<Utc>, file_name: &str) -> String {
    format!("{}_{}_{}", device_id, now.format("%Y%m%d%H%M%S"), file_name)
}

/// Storage URL for an upload slot.
pub fn blob_url(slot: &UploadSlot) -> String {
    format!(
        "https://{}/{}/{}?{}",
        slot.host_name, slot.container_name, slot.blob_name, slot.sas_token
    )
}

/// HTTP client bound to one device's hub identity.
pub struct HubClient {
    http: reqwest::Client,
    host: String,
    device_id: String,
    signer: SasSigner,
}

impl HubClient {
    pub fn new(conn: &ConnectionString) -> Result<Self, HubError> {
        let device_id = conn
            .device_id
            .clone()
            .ok_or_else(|| HubError::Credential("connection string has no DeviceId".to_string()))?;
        let signer = SasSigner::new(&conn.shared_access_key, None)?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            host: conn.host_name.clone(),
            device_id,
            signer,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resource(&self) -> String {
        format!("{}/devices/{}", self.host, self.device_id)
    }

    fn device_url(&self, suffix: &str) -> String {
        format!("https://{}/devices/{}{}", self.host, self.device_id, suffix)
    }

    async fn request_upload_slot(&self, blob_name: &str) -> Result<UploadSlot, HubError> {
        let response = self
            .http
            .post(self.device_url("/files"))
            .header(header::AUTHORIZATION, self.signer.token(&self.resource())?)
            .json(&serde_json::json!({ "blobName": blob_name }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HubError::Status(response.status()));
        }
        response
            .json::<UploadSlot>()
            .await
            .map_err(|e| HubError::Body(e.to_string()))
    }

    async fn put_blob(&self, slot: &UploadSlot, bytes: Vec<u8>) -> Result<(), HubError> {
        let response = self
            .http
            .put(blob_url(slot))
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HubError::Status(response.status()));
        }
        Ok(())
    }

    async fn notify_upload(
        &self,
        correlation_id: &str,
        is_success: bool,
        status_code: u16,
        status_description: &str,
    ) -> Result<(), HubError> {
        let response = self
            .http
            .post(self.device_url("/files/notifications"))
            .header(header::AUTHORIZATION, self.signer.token(&self.resource())?)
            .json(&UploadNotification {
                correlation_id,
                is_success,
                status_code,
                status_description,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HubError::Status(response.status()));
        }
        Ok(())
    }

    async fn upload_inner(&self, path: &Path) -> Result<String, HubError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                HubError::File(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path has no file name: {}", path.display()),
                ))
            })?;
        let bytes = tokio::fs::read(path).await?;
        let destination = destination_blob_name(&self.device_id, Utc::now(), file_name);
        log::info!("uploading {} bytes as {}", bytes.len(), destination);

        let slot = self.request_upload_slot(&destination).await?;
        match self.put_blob(&slot, bytes).await {
            Ok(()) => {
                self.notify_upload(&slot.correlation_id, true, 200, "OK").await?;
                Ok(slot.blob_name)
            }
            Err(e) => {
                // Best effort; the PUT failure is the error worth reporting
                if let Err(notify_err) = self
                    .notify_upload(&slot.correlation_id, false, 500, &e.to_string())
                    .await
                {
                    log::warn!("failed to notify upload failure: {notify_err}");
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl DeviceTransport for HubClient {
    async fn send_telemetry(&self, payload: &[u8], content_type: &str) -> Result<(), HubError> {
        let response = self
            .http
            .post(self.device_url("/messages/events"))
            .header(header::AUTHORIZATION, self.signer.token(&self.resource())?)
            .header(header::CONTENT_TYPE, content_type)
            .body(payload.to_vec())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HubError::Status(response.status()));
        }
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> Result<String, HubError> {
        match tokio::time::timeout(
            Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            self.upload_inner(path),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(HubError::UploadTimeout(UPLOAD_TIMEOUT_SECS)),
        }
    }

    async fn receive_command(&self) -> Result<Option<CommandMessage>, HubError> {
        let response = self
            .http
            .get(self.device_url("/messages/devicebound"))
            .header(header::AUTHORIZATION, self.signer.token(&self.resource())?)
            .send()
            .await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => response
                .json::<CommandMessage>()
                .await
                .map(Some)
                .map_err(|e| HubError::Body(e.to_string())),
            status => Err(HubError::Status(status)),
        }
    }
}
