use thiserror::Error;

/// Fatal startup failures. Anything after a successful open is reported as a
/// per-write [`crate::bus::WriteOutcome`] instead.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("serial device {device} unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },
    #[error("baud rate {0} is not in the protocol 1.0 baud table")]
    BaudRateUnsupported(u32),
}

/// A stdin line that did not decode into one setpoint per joint.
///
/// `found` counts the integers parsed before the first invalid token, or the
/// total integer count when only the arity is wrong.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("expected {expected} integers, found {found}")]
pub struct DecodeError {
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("joint table is empty")]
    EmptyJointTable,
    #[error("joint id {0} outside valid bus range 1..=253")]
    InvalidJointId(u8),
    #[error("duplicate joint id {0}")]
    DuplicateJointId(u8),
    #[error("moving speed {0} outside 0..=1023")]
    MovingSpeedOutOfRange(u16),
    #[error("report interval must be non-zero")]
    ZeroReportInterval,
}
