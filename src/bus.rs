use async_trait::async_trait;

use crate::model::MotorId;

/// How a goal-position dispatch waits on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// One broadcast sync-write; no device reply is read. The outcome only
    /// reflects whether the request reached the wire.
    FireAndForget,
    /// One confirmed write per joint; each device's status reply is parsed.
    WaitForReply,
}

/// Result of one register write against one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    /// The bus transaction did not complete (timeout, garbled reply).
    CommunicationFailure(String),
    /// The device replied but flagged an internal fault (voltage, overload,
    /// checksum condition reported by the device itself).
    DeviceError(String),
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Success)
    }
}

/// Joint-level operations against a shared half-duplex servo bus.
///
/// Implementations must not be shared across concurrent callers; the session
/// loop is the single owner for the lifetime of a session.
#[async_trait]
pub trait MotorBus {
    /// Ping one device to check it answers on the bus.
    async fn probe(&mut self, id: MotorId) -> bool;

    /// Read one device's present-position register.
    async fn read_position(&mut self, id: MotorId) -> Result<u16, WriteOutcome>;

    /// Write the torque-enable register of every joint. Outcomes are parallel
    /// to `ids`.
    async fn set_torque(&mut self, ids: &[MotorId], enabled: bool) -> Vec<WriteOutcome>;

    /// Write the moving-speed register of every joint.
    async fn set_moving_speed(&mut self, ids: &[MotorId], speed: u16) -> Vec<WriteOutcome>;

    /// Dispatch goal positions in `ids` order. `ticks` must already be inside
    /// the device position domain. Outcomes are parallel to `ids`.
    async fn write_goal_positions(
        &mut self,
        ids: &[MotorId],
        ticks: &[u16],
        mode: WriteMode,
    ) -> Vec<WriteOutcome>;
}
