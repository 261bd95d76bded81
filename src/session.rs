use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::{
    bus::{MotorBus, WriteOutcome},
    config::ServerConfig,
    decoder,
    model::clamp_position,
};

/// Why the streaming loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    EndOfInput,
    Interrupted,
    WriteFailureLimit,
}

/// Aggregate result of one torque bracket: how many joints confirmed the
/// write out of how many were attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketReport {
    pub confirmed: usize,
    pub attempted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub commands_processed: u64,
    pub exit: ExitReason,
    pub torque_enabled: BracketReport,
    pub torque_disabled: BracketReport,
}

/// One emitted throughput sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub commands: u64,
    pub elapsed: Duration,
}

impl RateSample {
    pub fn per_second(&self) -> f64 {
        self.commands as f64 / self.elapsed.as_secs_f64()
    }
}

/// Commands-per-interval counter, reset on every emitted sample.
#[derive(Debug)]
pub struct SessionStats {
    commands_in_window: u64,
    window_start: Instant,
}

impl SessionStats {
    pub fn new(now: Instant) -> Self {
        Self {
            commands_in_window: 0,
            window_start: now,
        }
    }

    /// Account one processed command. Returns the finished window's sample
    /// once `interval` has elapsed; the command being recorded counts toward
    /// the next window.
    pub fn record(&mut self, now: Instant, interval: Duration) -> Option<RateSample> {
        let elapsed = now.duration_since(self.window_start);
        let sample = if elapsed >= interval {
            let sample = RateSample {
                commands: self.commands_in_window,
                elapsed,
            };
            self.commands_in_window = 0;
            self.window_start = now;
            Some(sample)
        } else {
            None
        };
        self.commands_in_window += 1;
        sample
    }
}

/// Run one full command session over an already-open bus: enable torque on
/// every joint, stream goal vectors from `input` until quit, end of input,
/// an interrupt, or the configured failure limit, then disable torque.
///
/// The torque brackets are best effort; per-joint outcomes are logged and
/// aggregated into the summary without aborting startup or shutdown.
pub async fn run_session<B, R>(bus: &mut B, cfg: &ServerConfig, input: R) -> SessionSummary
where
    B: MotorBus,
    R: AsyncBufRead + Unpin,
{
    let torque_enabled = set_torque_bracket(bus, cfg, true).await;
    info!(
        confirmed = torque_enabled.confirmed,
        attempted = torque_enabled.attempted,
        "torque enabled"
    );

    if let Some(speed) = cfg.moving_speed {
        let outcomes = bus.set_moving_speed(&cfg.joint_ids, speed).await;
        let confirmed = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            speed,
            confirmed,
            attempted = cfg.joint_ids.len(),
            "moving speed configured"
        );
    }

    let (commands_processed, exit) = stream_commands(bus, cfg, input).await;

    let torque_disabled = set_torque_bracket(bus, cfg, false).await;
    info!(
        confirmed = torque_disabled.confirmed,
        attempted = torque_disabled.attempted,
        "torque disabled"
    );

    SessionSummary {
        commands_processed,
        exit,
        torque_enabled,
        torque_disabled,
    }
}

async fn stream_commands<B, R>(bus: &mut B, cfg: &ServerConfig, mut input: R) -> (u64, ExitReason)
where
    B: MotorBus,
    R: AsyncBufRead + Unpin,
{
    let mut stats = SessionStats::new(Instant::now());
    let mut commands = 0u64;
    let mut consecutive_failures = 0u32;
    let mut line = String::new();

    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("interrupt handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(interrupt);

    loop {
        line.clear();
        let read = tokio::select! {
            _ = &mut interrupt => {
                warn!("interrupt received, closing session");
                return (commands, ExitReason::Interrupted);
            }
            read = input.read_line(&mut line) => read,
        };

        match read {
            Ok(0) => return (commands, ExitReason::EndOfInput),
            Ok(_) => {}
            Err(e) => {
                warn!("input stream error, treating as end of input: {e}");
                return (commands, ExitReason::EndOfInput);
            }
        }

        if decoder::is_quit(&line) {
            return (commands, ExitReason::Quit);
        }

        let goals = match decoder::decode_goal_line(&line, cfg.joint_ids.len()) {
            Ok(goals) => goals,
            Err(e) => {
                warn!("skipping malformed line {:?}: {e}", line.trim_end());
                continue;
            }
        };

        let ticks: Vec<u16> = goals.iter().copied().map(clamp_position).collect();
        let outcomes = bus
            .write_goal_positions(&cfg.joint_ids, &ticks, cfg.write_mode)
            .await;

        let mut comm_failed = false;
        for (id, outcome) in cfg.joint_ids.iter().zip(&outcomes) {
            match outcome {
                WriteOutcome::Success => {}
                WriteOutcome::CommunicationFailure(detail) => {
                    comm_failed = true;
                    warn!(id = id.0, "goal write lost on the bus: {detail}");
                }
                WriteOutcome::DeviceError(detail) => {
                    warn!(id = id.0, "device fault on goal write: {detail}");
                }
            }
        }

        commands += 1;
        if let Some(sample) = stats.record(Instant::now(), cfg.report_interval) {
            info!(
                commands = sample.commands,
                "{:.1} commands/s",
                sample.per_second()
            );
        }

        if comm_failed {
            consecutive_failures += 1;
            if let Some(limit) = cfg.max_consecutive_failures {
                if consecutive_failures >= limit {
                    error!("ending stream after {consecutive_failures} consecutive failed dispatches");
                    return (commands, ExitReason::WriteFailureLimit);
                }
            }
        } else {
            consecutive_failures = 0;
        }
    }
}

async fn set_torque_bracket<B: MotorBus>(
    bus: &mut B,
    cfg: &ServerConfig,
    enabled: bool,
) -> BracketReport {
    let outcomes = bus.set_torque(&cfg.joint_ids, enabled).await;
    let mut confirmed = 0;
    for (id, outcome) in cfg.joint_ids.iter().zip(&outcomes) {
        if outcome.is_success() {
            confirmed += 1;
        } else {
            warn!(id = id.0, enabled, "torque write not confirmed: {outcome:?}");
        }
    }
    BracketReport {
        confirmed,
        attempted: cfg.joint_ids.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn one_sample_per_elapsed_interval() {
        let interval = Duration::from_secs(1);
        let mut stats = SessionStats::new(Instant::now());

        for _ in 0..250 {
            assert_eq!(stats.record(Instant::now(), interval), None);
        }

        tokio::time::advance(Duration::from_secs(1)).await;
        let sample = stats
            .record(Instant::now(), interval)
            .expect("window elapsed");
        assert_eq!(sample.commands, 250);
        assert!((sample.per_second() - 250.0).abs() < f64::EPSILON);

        // The 251st command opened the next window.
        tokio::time::advance(Duration::from_secs(1)).await;
        let next = stats
            .record(Instant::now(), interval)
            .expect("second window");
        assert_eq!(next.commands, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_sample_inside_the_window() {
        let mut stats = SessionStats::new(Instant::now());
        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(stats.record(Instant::now(), Duration::from_secs(1)), None);
    }
}
