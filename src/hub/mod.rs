//! Hub transport
//!
//! The device talks to the cloud hub over a small REST surface: telemetry
//! POSTs, a two-phase blob upload, and a polling endpoint for
//! cloud-to-device commands. The management tool uses the service-side
//! surface (device listing, command push). Requests are authenticated with
//! per-request shared-access signatures.

pub mod client;
pub mod sas;
pub mod service;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::command::CommandMessage;

pub use client::HubClient;
pub use service::ServiceClient;

/// Content type tag for telemetry payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Error types for hub operations
#[derive(Error, Debug)]
pub enum HubError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("hub returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid credential: {0}")]
    Credential(String),

    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    #[error("unexpected response body: {0}")]
    Body(String),

    #[error("upload timed out after {0} seconds")]
    UploadTimeout(u64),
}

/// What the sender loop needs from a transport.
///
/// The production implementation is [`HubClient`]; tests substitute an
/// in-memory mock.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Send one message, an opaque payload plus a content-type tag.
    async fn send_telemetry(&self, payload: &[u8], content_type: &str) -> Result<(), HubError>;

    /// Upload a local file; returns the hub-assigned remote identifier.
    async fn upload_file(&self, path: &Path) -> Result<String, HubError>;

    /// Poll for a pending cloud-to-device command, if any.
    async fn receive_command(&self) -> Result<Option<CommandMessage>, HubError>;
}
