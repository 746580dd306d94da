//! Connection configuration
//!
//! Credentials are opaque connection strings looked up from the environment:
//! `<DEVICE_NAME>_CONNECTION_STRING` for devices (uppercased, dashes become
//! underscores), `HUB_CONNECTION_STRING` for the management tool.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable holding the service-side connection string.
pub const SERVICE_CONNECTION_ENV: &str = "HUB_CONNECTION_STRING";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable not set: {0}")]
    MissingEnv(String),

    #[error("malformed connection string segment: {0}")]
    Malformed(String),

    #[error("connection string missing field: {0}")]
    MissingField(&'static str),
}

/// Parsed hub connection string.
///
/// Device strings carry `DeviceId`; service strings carry
/// `SharedAccessKeyName`. The shared key stays base64 until the signer
/// decodes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionString {
    pub host_name: String,
    pub device_id: Option<String>,
    pub key_name: Option<String>,
    pub shared_access_key: String,
}

impl FromStr for ConnectionString {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut host_name = None;
        let mut device_id = None;
        let mut key_name = None;
        let mut shared_access_key = None;

        for segment in s.split(';').filter(|seg| !seg.trim().is_empty()) {
            // Only the first '=' separates key from value; base64 padding in
            // the shared key must survive intact.
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConfigError::Malformed(segment.to_string()))?;
            match key.trim() {
                "HostName" => host_name = Some(value.trim().to_string()),
                "DeviceId" => device_id = Some(value.trim().to_string()),
                "SharedAccessKeyName" => key_name = Some(value.trim().to_string()),
                "SharedAccessKey" => shared_access_key = Some(value.trim().to_string()),
                _ => {}
            }
        }

        Ok(Self {
            host_name: host_name.ok_or(ConfigError::MissingField("HostName"))?,
            device_id,
            key_name,
            shared_access_key: shared_access_key
                .ok_or(ConfigError::MissingField("SharedAccessKey"))?,
        })
    }
}

/// Environment variable name for a device's connection string.
pub fn connection_env_var(device_name: &str) -> String {
    let mut var = device_name.to_uppercase().replace('-', "_");
    var.push_str("_CONNECTION_STRING");
    var
}

/// Look up and parse a device connection string from the environment.
pub fn device_connection_string(device_name: &str) -> Result<ConnectionString, ConfigError> {
    let var = connection_env_var(device_name);
    let raw = env::var(&var).map_err(|_| ConfigError::MissingEnv(var))?;
    let conn: ConnectionString = raw.parse()?;
    if conn.device_id.is_none() {
        return Err(ConfigError::MissingField("DeviceId"));
    }
    Ok(conn)
}

/// Look up and parse the service connection string from the environment.
pub fn service_connection_string() -> Result<ConnectionString, ConfigError> {
    let raw = env::var(SERVICE_CONNECTION_ENV)
        .map_err(|_| ConfigError::MissingEnv(SERVICE_CONNECTION_ENV.to_string()))?;
    let conn: ConnectionString = raw.parse()?;
    if conn.key_name.is_none() {
        return Err(ConfigError::MissingField("SharedAccessKeyName"));
    }
    Ok(conn)
}
