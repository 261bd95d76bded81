use std::time::Duration;

use crate::{
    bus::WriteMode,
    error::ConfigError,
    model::{MotorId, MOVING_SPEED_MAX},
};

/// Startup configuration for one command session. Built once at process
/// entry and passed down; nothing reads ambient globals.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub device: String,
    pub baud_rate: u32,
    /// Logical joint index -> bus device id, fixed for the session.
    pub joint_ids: Vec<MotorId>,
    pub write_mode: WriteMode,
    /// Moving-speed register value written once to every joint before
    /// streaming starts.
    pub moving_speed: Option<u16>,
    pub report_interval: Duration,
    /// Consecutive comm-failed dispatches tolerated before the session ends.
    /// `None` never aborts.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 57_600,
            joint_ids: (1..=8).map(MotorId).collect(),
            write_mode: WriteMode::FireAndForget,
            moving_speed: None,
            report_interval: Duration::from_secs(1),
            max_consecutive_failures: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.joint_ids.is_empty() {
            return Err(ConfigError::EmptyJointTable);
        }
        let mut seen = [false; 254];
        for id in &self.joint_ids {
            if !(1..=253).contains(&id.0) {
                return Err(ConfigError::InvalidJointId(id.0));
            }
            if seen[id.0 as usize] {
                return Err(ConfigError::DuplicateJointId(id.0));
            }
            seen[id.0 as usize] = true;
        }
        if let Some(speed) = self.moving_speed {
            if speed > MOVING_SPEED_MAX {
                return Err(ConfigError::MovingSpeedOutOfRange(speed));
            }
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::ZeroReportInterval);
        }
        Ok(())
    }
}
