//! Management CLI
//!
//! Pushes the diagnostic-data command to one or all registered devices, or
//! lists them. Credentials come from `HUB_CONNECTION_STRING`.

use anyhow::Context;
use chrono::Utc;
use clap::{CommandFactory, Parser};

use vitalink::command::CommandMessage;
use vitalink::config::{self, ConfigError, SERVICE_CONNECTION_ENV};
use vitalink::hub::ServiceClient;

#[derive(Parser)]
#[command(name = "device_manager", about = "Push command messages to simulated devices")]
struct Cli {
    /// List registered devices
    #[arg(long)]
    list: bool,

    /// Send the diagnostic command to one device
    #[arg(long, value_name = "DEVICE_ID")]
    device: Option<String>,

    /// Send the diagnostic command to every registered device
    #[arg(long)]
    send_all: bool,
}

async fn send_command_to(client: &ServiceClient, device_id: &str) -> bool {
    let command = CommandMessage::diagnostic_request(Utc::now());
    println!("\n--- Sending message to {device_id} ---");
    println!("Command: {}", command.command);
    println!("Description: {}", command.description);
    match client.send_command(device_id, &command).await {
        Ok(()) => {
            println!("Message sent successfully to {device_id}");
            true
        }
        Err(e) => {
            log::error!("error sending message to {device_id}: {e}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.list && !cli.send_all && cli.device.is_none() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let conn = match config::service_connection_string() {
        Ok(conn) => conn,
        Err(ConfigError::MissingEnv(var)) => {
            eprintln!("[ERROR] Environment variable not set: {var}");
            eprintln!("Please set it using:");
            eprintln!("export {SERVICE_CONNECTION_ENV}=\"HostName=...\"");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("invalid connection string"),
    };
    let client = ServiceClient::new(&conn).context("failed to create service client")?;
    println!("Connected to hub successfully");

    if cli.list {
        println!("\n--- Registered Devices ---");
        let devices = client.list_devices().await.context("failed to list devices")?;
        if devices.is_empty() {
            println!("  No devices found");
        }
        for id in devices {
            println!("  - {id}");
        }
        return Ok(());
    }

    if cli.send_all {
        let devices = client.list_devices().await.context("failed to list devices")?;
        if devices.is_empty() {
            println!("No devices found to send messages to");
            return Ok(());
        }

        println!("\nSending messages to {} device(s)...", devices.len());
        let mut success = 0usize;
        for id in &devices {
            if send_command_to(&client, id).await {
                success += 1;
            }
        }

        println!("\n--- Summary ---");
        println!("Total devices: {}", devices.len());
        println!("Success: {success}");
        println!("Failed: {}", devices.len() - success);
        return Ok(());
    }

    if let Some(device) = &cli.device {
        send_command_to(&client, device).await;
    }

    Ok(())
}
