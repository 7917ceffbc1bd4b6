//! Seqbox Sequence Player - main entry point
//!
//! Command-line controlling context for the sequence player: loads a CSV
//! schedule, opens the serial port, starts a run, prints progress to the
//! console, and maps Ctrl-C to a clean stop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqbox_common::config;
use seqbox_common::events::{EventBus, PlayerEvent};
use seqbox_common::schedule::Schedule;
use seqbox_common::time::format_clock;
use seqbox_sp::player::{PlayerState, SequencePlayer};
use seqbox_sp::serial::{self, SerialChannel};

/// Command-line arguments for seqbox-sp
#[derive(Parser, Debug)]
#[command(name = "seqbox-sp")]
#[command(about = "Replay a timed command schedule to a serial device")]
#[command(version)]
struct Args {
    /// Serial port to use (e.g. /dev/ttyACM0 or COM9)
    #[arg(short, long)]
    port: Option<String>,

    /// CSV schedule to play (columns: 'Time (min)', 'Output')
    #[arg(short, long, env = "SEQBOX_SCHEDULE")]
    schedule: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_toml_config().context("Failed to load config file")?;

    // Initialize tracing
    let default_filter = format!(
        "seqbox_sp={level},seqbox_common={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.list_ports {
        return list_ports();
    }

    let schedule_arg = args
        .schedule
        .context("No schedule given: pass --schedule or set SEQBOX_SCHEDULE")?;
    let schedule_path = config::resolve_schedule_path(&schedule_arg, &config);
    let schedule = Schedule::load(&schedule_path)
        .with_context(|| format!("Failed to load schedule {}", schedule_path.display()))?;
    info!(
        "Loaded schedule {} with {} entries",
        schedule_path.display(),
        schedule.len()
    );

    let port = config::resolve_port(args.port.as_deref(), &config)
        .context("Failed to resolve serial port")?;
    let channel = SerialChannel::open(&port, Duration::from_secs(1))
        .with_context(|| format!("Failed to open serial port {}", port))?;

    // the board resets when the port opens; give it time to come back
    info!("Waiting for the device to settle after reset");
    tokio::time::sleep(serial::RESET_SETTLE).await;

    let events = Arc::new(EventBus::new(256));
    let mut rx = events.subscribe();
    let player = SequencePlayer::new(Arc::clone(&events));

    player.start(schedule, Box::new(channel)).await?;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping run");
                player.stop().await?;
            }
            event = rx.recv() => match event {
                Ok(event) => {
                    let done = matches!(
                        event,
                        PlayerEvent::Stopped { .. }
                            | PlayerEvent::Finished { .. }
                            | PlayerEvent::Failed { .. }
                    );
                    print_event(&event);
                    if done {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    info!("Console lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    player.wait_until_done().await?;

    if let PlayerState::Failed { reason } = player.state().await {
        bail!("Run failed: {}", reason);
    }
    Ok(())
}

fn list_ports() -> Result<()> {
    let ports = serial::list_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports available");
        return Ok(());
    }
    for port in ports {
        match port.description {
            Some(description) => println!("{} - {}", port.name, description),
            None => println!("{}", port.name),
        }
    }
    Ok(())
}

/// Render one event as an operator console line
fn print_event(event: &PlayerEvent) {
    match event {
        PlayerEvent::Started { entries, .. } => {
            console(&format!("Sequence started ({} commands)", entries), true)
        }
        PlayerEvent::Progress {
            scheduled_offset_minutes,
            command,
            timestamp,
            ..
        } => console(
            &format!(
                "Current time: {} | Scheduled: {} min | Output: {}",
                format_clock(*timestamp),
                scheduled_offset_minutes,
                command
            ),
            false,
        ),
        PlayerEvent::Paused { .. } => console("Sequence paused", true),
        PlayerEvent::Resumed { .. } => console("Sequence resumed", true),
        PlayerEvent::Stopped { commands_sent, .. } => console(
            &format!("Sequence stopped after {} commands", commands_sent),
            true,
        ),
        PlayerEvent::Finished { commands_sent, .. } => console(
            &format!("Sequence finished, {} commands sent", commands_sent),
            true,
        ),
        PlayerEvent::Failed { reason, .. } => {
            console(&format!("Sequence FAILED: {}", reason), true)
        }
        PlayerEvent::InvalidTransition {
            requested, state, ..
        } => console(&format!("Ignored '{}' while {}", requested, state), true),
    }
}

fn console(message: &str, separate: bool) {
    println!("{}", message);
    if separate {
        println!("{}", "-".repeat(72));
    }
}
