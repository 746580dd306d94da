//! Device-side loops: telemetry sending and command polling
//!
//! Shutdown is cooperative. Binaries create a [`shutdown_channel`], wire the
//! handle to SIGINT, and pass tokens into the loops; both the interval wait
//! and the in-flight send race against the token, so shutdown latency never
//! depends on the configured interval. The generator itself knows nothing
//! about cancellation.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;

use crate::console::{severity_color, severity_label, COLOR_RESET};
use crate::hub::{DeviceTransport, CONTENT_TYPE_JSON};
use crate::telemetry::{
    generate_with, DEFAULT_CRITICAL_RATE_PERCENT, DEFAULT_WARNING_RATE_PERCENT,
};

/// How often the device asks the hub for pending commands.
pub const COMMAND_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Requests shutdown of every loop holding a matching token.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cooperative cancellation observed by the loops.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. A dropped handle counts as
    /// shutdown: a loop must not outlive its controller.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Create a linked shutdown handle/token pair.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownToken { rx })
}

/// Telemetry cadence and severity mix for one device run.
#[derive(Clone, Copy, Debug)]
pub struct SenderOptions {
    pub interval: Duration,
    pub warning_rate_percent: f64,
    pub critical_rate_percent: f64,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            warning_rate_percent: DEFAULT_WARNING_RATE_PERCENT,
            critical_rate_percent: DEFAULT_CRITICAL_RATE_PERCENT,
        }
    }
}

/// Generate and send telemetry until shutdown; returns the number of records
/// handed to the transport.
///
/// Send failures are logged and the loop keeps going; only shutdown stops it.
/// Each loop owns an independent random source, so concurrent device
/// simulations never share rng state.
pub async fn run_telemetry_loop(
    transport: Arc<dyn DeviceTransport>,
    device_id: String,
    options: SenderOptions,
    mut shutdown: ShutdownToken,
) -> u64 {
    let mut rng = StdRng::from_entropy();
    let mut sent: u64 = 0;

    loop {
        if shutdown.is_shutdown() {
            break;
        }

        let record = generate_with(
            &mut rng,
            chrono::Utc::now(),
            &device_id,
            options.warning_rate_percent,
            options.critical_rate_percent,
        );
        let json = serde_json::to_string(&record).unwrap();

        sent += 1;
        let color = severity_color(record.patient_status);
        let label = severity_label(record.patient_status);
        println!("[{sent}] Sending telemetry... {color}{label}{COLOR_RESET}");
        println!("{color}    Data: {json}{COLOR_RESET}");

        tokio::select! {
            result = transport.send_telemetry(json.as_bytes(), CONTENT_TYPE_JSON) => match result {
                Ok(()) => println!("[OK] Message sent successfully"),
                Err(e) => log::error!("failed to send telemetry: {e}"),
            },
            _ = shutdown.cancelled() => {
                log::info!("send cancelled (shutting down)");
                break;
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(options.interval) => {}
        }
    }

    sent
}

/// Poll for cloud-to-device commands until shutdown, rendering each one.
///
/// Commands only reach the operator's screen; they never feed back into
/// telemetry generation.
pub async fn run_command_poll_loop(
    transport: Arc<dyn DeviceTransport>,
    poll_interval: Duration,
    mut shutdown: ShutdownToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
        match transport.receive_command().await {
            Ok(Some(command)) => println!("{}", command.render()),
            Ok(None) => {}
            Err(e) => log::warn!("command poll failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::command::CommandMessage;
    use crate::hub::HubError;
    use crate::telemetry::{classify, Severity, TelemetryRecord};

    #[derive(Default)]
    struct MockTransport {
        payloads: Mutex<Vec<Vec<u8>>>,
        fail_sends: AtomicBool,
        commands: Mutex<Vec<CommandMessage>>,
    }

    #[async_trait]
    impl DeviceTransport for MockTransport {
        async fn send_telemetry(&self, payload: &[u8], _content_type: &str) -> Result<(), HubError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(HubError::Body("mock send failure".to_string()));
            }
            self.payloads.lock().unwrap().push(payload.to_vec());
            Ok(())
        }

        async fn upload_file(&self, _path: &Path) -> Result<String, HubError> {
            Ok("mock-blob".to_string())
        }

        async fn receive_command(&self) -> Result<Option<CommandMessage>, HubError> {
            Ok(self.commands.lock().unwrap().pop())
        }
    }

    fn fast_options() -> SenderOptions {
        SenderOptions {
            interval: Duration::from_millis(1),
            warning_rate_percent: 0.0,
            critical_rate_percent: 0.0,
        }
    }

    #[tokio::test]
    async fn test_telemetry_loop_sends_valid_records() {
        let mock = Arc::new(MockTransport::default());
        let (handle, token) = shutdown_channel();
        let task = tokio::spawn(run_telemetry_loop(
            mock.clone(),
            "dev1".to_string(),
            fast_options(),
            token,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();
        let sent = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop did not stop")
            .unwrap();

        let payloads = mock.payloads.lock().unwrap();
        assert!(sent > 0);
        assert_eq!(payloads.len() as u64, sent);
        for payload in payloads.iter() {
            let record: TelemetryRecord = serde_json::from_slice(payload).unwrap();
            assert_eq!(record.device_id, "dev1");
            assert_eq!(record.patient_status, Severity::Normal);
            assert_eq!(record.patient_status, classify(&record.vital_signs()));
        }
    }

    #[tokio::test]
    async fn test_telemetry_loop_stops_promptly_despite_long_interval() {
        let mock = Arc::new(MockTransport::default());
        let (handle, token) = shutdown_channel();
        let options = SenderOptions {
            interval: Duration::from_secs(3600),
            ..fast_options()
        };
        let task = tokio::spawn(run_telemetry_loop(
            mock.clone(),
            "dev1".to_string(),
            options,
            token,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();
        let sent = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("shutdown latency exceeded bound")
            .unwrap();
        assert_eq!(sent, 1);
    }

    #[tokio::test]
    async fn test_telemetry_loop_survives_send_failures() {
        let mock = Arc::new(MockTransport::default());
        mock.fail_sends.store(true, Ordering::SeqCst);
        let (handle, token) = shutdown_channel();
        let task = tokio::spawn(run_telemetry_loop(
            mock.clone(),
            "dev1".to_string(),
            fast_options(),
            token,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();
        let sent = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop did not stop")
            .unwrap();

        assert!(sent > 1, "loop should keep attempting after failures");
        assert!(mock.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_command_poll_loop_consumes_pending_command() {
        let mock = Arc::new(MockTransport::default());
        mock.commands
            .lock()
            .unwrap()
            .push(CommandMessage::diagnostic_request(chrono::Utc::now()));
        let (handle, token) = shutdown_channel();
        let task = tokio::spawn(run_command_poll_loop(
            mock.clone(),
            Duration::from_millis(1),
            token,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poll loop did not stop")
            .unwrap();
        assert!(mock.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_token_states() {
        let (handle, mut token) = shutdown_channel();
        assert!(!token.is_shutdown());
        handle.shutdown();
        assert!(token.is_shutdown());
        // Already-cancelled tokens resolve immediately
        tokio::time::timeout(Duration::from_millis(10), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_handle_counts_as_shutdown() {
        let (handle, mut token) = shutdown_channel();
        drop(handle);
        tokio::time::timeout(Duration::from_millis(10), token.cancelled())
            .await
            .unwrap();
    }
}
