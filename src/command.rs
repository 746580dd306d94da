//! Cloud-to-device command messages
//!
//! Shared between the management tool (which builds and pushes them) and the
//! device simulator (which only displays them; commands never influence
//! telemetry generation).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::console::{COLOR_RED, COLOR_RESET};

/// Sender tag stamped on messages built by the management tool.
pub const MANAGEMENT_SENDER: &str = "management-app";

/// One out-of-band command delivered to a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMessage {
    /// `msg-YYYYMMDDHHMMSS`, UTC
    pub message_id: String,
    pub timestamp: String,
    pub command: String,
    pub description: String,
    /// Command-specific payload, passed through opaquely
    pub parameters: serde_json::Value,
    pub sender: String,
    pub priority: String,
}

impl CommandMessage {
    /// The diagnostic-data request pushed by the management tool.
    pub fn diagnostic_request(now: DateTime<Utc>) -> Self {
        Self {
            message_id: format!("msg-{}", now.format("%Y%m%d%H%M%S")),
            timestamp: format!("{}Z", now.format("%Y-%m-%dT%H:%M:%S%.6f")),
            command: "request_diagnostic_data".to_string(),
            description: "Request for diagnostic data".to_string(),
            parameters: json!({
                "include_logs": true,
                "time_range_hours": 24,
            }),
            sender: MANAGEMENT_SENDER.to_string(),
            priority: "normal".to_string(),
        }
    }

    /// Render the red banner shown when a device receives a command.
    pub fn render(&self) -> String {
        let body = serde_json::to_string_pretty(self).unwrap_or_else(|_| "<unprintable>".into());
        format!(
            "\n{COLOR_RED}========================================\n\
             [C2D] Cloud-to-Device message received\n\
             ========================================{COLOR_RESET}\n\
             {COLOR_RED}Message ID: {}{COLOR_RESET}\n\
             {COLOR_RED}Command: {} ({}){COLOR_RESET}\n\
             {COLOR_RED}Message content:\n{}{COLOR_RESET}\n\
             {COLOR_RED}========================================{COLOR_RESET}\n",
            self.message_id, self.command, self.description, body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_request_shape() {
        let now = "2024-05-01T12:34:56Z".parse::<DateTime<Utc>>().unwrap();
        let cmd = CommandMessage::diagnostic_request(now);
        assert_eq!(cmd.message_id, "msg-20240501123456");
        assert_eq!(cmd.command, "request_diagnostic_data");
        assert_eq!(cmd.sender, MANAGEMENT_SENDER);
        assert_eq!(cmd.priority, "normal");
        assert_eq!(cmd.parameters["include_logs"], json!(true));
        assert_eq!(cmd.parameters["time_range_hours"], json!(24));
    }

    #[test]
    fn test_command_wire_keys_are_camel_case() {
        let now = "2024-05-01T12:34:56Z".parse::<DateTime<Utc>>().unwrap();
        let json = serde_json::to_string(&CommandMessage::diagnostic_request(now)).unwrap();
        assert!(json.contains("\"messageId\":\"msg-20240501123456\""));
        assert!(json.contains("\"parameters\":{"));
    }

    #[test]
    fn test_command_round_trips() {
        let now = "2024-05-01T12:34:56Z".parse::<DateTime<Utc>>().unwrap();
        let cmd = CommandMessage::diagnostic_request(now);
        let parsed: CommandMessage =
            serde_json::from_str(&serde_json::to_string(&cmd).unwrap()).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_render_mentions_id_and_command() {
        let now = "2024-05-01T12:34:56Z".parse::<DateTime<Utc>>().unwrap();
        let banner = CommandMessage::diagnostic_request(now).render();
        assert!(banner.contains("msg-20240501123456"));
        assert!(banner.contains("request_diagnostic_data"));
        assert!(banner.contains("Cloud-to-Device message received"));
    }
}
