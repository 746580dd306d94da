//! Device simulator CLI
//!
//! Telemetry mode sends synthetic vital-sign records until interrupted;
//! upload mode pushes one file to the hub. Credentials come from
//! `<DEVICE_NAME>_CONNECTION_STRING`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use vitalink::config::{self, ConfigError};
use vitalink::hub::{DeviceTransport, HubClient};
use vitalink::sender::{self, shutdown_channel, SenderOptions};
use vitalink::telemetry::{DEFAULT_CRITICAL_RATE_PERCENT, DEFAULT_WARNING_RATE_PERCENT};

#[derive(Parser)]
#[command(name = "device_sim", about = "Medical device telemetry simulator")]
struct Cli {
    /// Device name, e.g. icu-device01
    device_name: String,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send telemetry at a fixed cadence until interrupted
    Telemetry {
        /// Send interval in milliseconds
        #[arg(long, default_value_t = 5000)]
        interval: u64,

        /// Probability of warning-severity records, percent
        #[arg(long, default_value_t = DEFAULT_WARNING_RATE_PERCENT)]
        warning_rate: f64,

        /// Probability of critical-severity records, percent
        #[arg(long, default_value_t = DEFAULT_CRITICAL_RATE_PERCENT)]
        critical_rate: f64,
    },
    /// Upload one file to the hub
    Upload {
        /// Path of the file to upload
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let conn = match config::device_connection_string(&cli.device_name) {
        Ok(conn) => conn,
        Err(ConfigError::MissingEnv(var)) => {
            eprintln!("[ERROR] Environment variable not set: {var}");
            eprintln!("Please set it using:");
            eprintln!("export {var}=\"HostName=...\"");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("invalid connection string"),
    };

    println!("===========================================");
    println!(" Vitalink Device Simulator");
    println!("===========================================");
    println!("Device: {}", cli.device_name);
    println!("===========================================\n");

    let client = Arc::new(HubClient::new(&conn).context("failed to create device client")?);

    match cli.mode {
        Mode::Telemetry {
            interval,
            warning_rate,
            critical_rate,
        } => {
            let options = SenderOptions {
                interval: Duration::from_millis(interval),
                warning_rate_percent: warning_rate,
                critical_rate_percent: critical_rate,
            };

            println!("[INFO] Starting telemetry mode");
            println!("[INFO] Device ID: {}", cli.device_name);
            println!("[INFO] Interval: {interval} ms");
            println!("[INFO] Warning rate: {warning_rate}%, Critical rate: {critical_rate}%");
            println!("[INFO] Press Ctrl+C to stop\n");

            let (handle, token) = shutdown_channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    println!("\n[INFO] Interrupt signal received. Shutting down...");
                    handle.shutdown();
                }
            });

            let transport: Arc<dyn DeviceTransport> = client;
            let poller = tokio::spawn(sender::run_command_poll_loop(
                transport.clone(),
                sender::COMMAND_POLL_INTERVAL,
                token.clone(),
            ));
            let sent = sender::run_telemetry_loop(
                transport,
                cli.device_name.clone(),
                options,
                token,
            )
            .await;
            let _ = poller.await;

            println!("\n[INFO] Telemetry mode stopped. Total messages sent: {sent}");
        }
        Mode::Upload { file } => {
            println!("[INFO] Starting upload mode");
            println!("[INFO] Device ID: {}", cli.device_name);
            println!("[INFO] File path: {}", file.display());

            let metadata = tokio::fs::metadata(&file)
                .await
                .with_context(|| format!("file not found: {}", file.display()))?;
            anyhow::ensure!(metadata.is_file(), "not a regular file: {}", file.display());
            println!("[INFO] File size: {} bytes", metadata.len());
            println!("[INFO] Upload in progress...");

            let remote = client
                .upload_file(&file)
                .await
                .context("file upload failed")?;
            println!("[OK] File upload completed successfully: {remote}");
        }
    }

    println!("\n[INFO] Device simulator terminated");
    Ok(())
}
