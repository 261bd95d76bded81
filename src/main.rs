use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rx24f_motor_server::{run_session, DynamixelBus, MotorBus, MotorId, ServerConfig, WriteMode};

/// Streaming joint-position server for an RX-24F chain.
///
/// Reads one whitespace-separated integer setpoint per joint per stdin line
/// and relays each vector onto the bus; `QUIT` or end of input shuts the
/// session down with torque disabled.
#[derive(Parser)]
#[command(name = "motor_server", version)]
struct Args {
    /// Serial device of the Dynamixel bus
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,
    /// Bus baud rate
    #[arg(short, long, default_value_t = 57_600)]
    baud_rate: u32,
    /// Bus ids of the joints, in fixed joint order
    #[arg(long, value_delimiter = ',', default_values_t = [1u8, 2, 3, 4, 5, 6, 7, 8])]
    ids: Vec<u8>,
    /// Confirm every goal write with the device reply instead of broadcasting
    #[arg(long)]
    confirm_writes: bool,
    /// Moving-speed register value written to every joint before streaming
    #[arg(long)]
    moving_speed: Option<u16>,
    /// Throughput reporting interval in milliseconds
    #[arg(long, default_value_t = 1_000)]
    report_interval_ms: u64,
    /// End the session after this many consecutive failed dispatches
    #[arg(long)]
    max_consecutive_failures: Option<u32>,
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ServerConfig {
        device: args.port,
        baud_rate: args.baud_rate,
        joint_ids: args.ids.into_iter().map(MotorId).collect(),
        write_mode: if args.confirm_writes {
            WriteMode::WaitForReply
        } else {
            WriteMode::FireAndForget
        },
        moving_speed: args.moving_speed,
        report_interval: Duration::from_millis(args.report_interval_ms),
        max_consecutive_failures: args.max_consecutive_failures,
    };
    config.validate().context("invalid configuration")?;

    let mut bus = DynamixelBus::open(&config.device, config.baud_rate)
        .with_context(|| format!("opening {}", config.device))?;
    info!(device = %config.device, baud = config.baud_rate, "port open");

    for id in &config.joint_ids {
        if !bus.probe(*id).await {
            warn!(id = id.0, "joint did not answer ping");
            continue;
        }
        match bus.read_position(*id).await {
            Ok(ticks) => debug!(id = id.0, ticks, "joint present"),
            Err(outcome) => warn!(id = id.0, "joint answered ping but not a read: {outcome:?}"),
        }
    }

    let summary = run_session(&mut bus, &config, BufReader::new(tokio::io::stdin())).await;
    info!(
        commands = summary.commands_processed,
        exit = ?summary.exit,
        "session closed, torque disabled and port released"
    );
    Ok(())
}
