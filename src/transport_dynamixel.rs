use async_trait::async_trait;
use dynamixel_driver::{DynamixelDriver, DynamixelDriverError, SyncCommand};
use tracing::debug;

use crate::{
    bus::{MotorBus, WriteMode, WriteOutcome},
    error::BusError,
    model::MotorId,
};

/// Baud rates the protocol 1.0 line configuration accepts.
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    9_600, 19_200, 57_600, 115_200, 200_000, 250_000, 400_000, 500_000, 1_000_000,
];

/// Serial transport backed by the vendor Dynamixel SDK. Packet framing,
/// checksums and reply parsing live entirely in the SDK; this adapter only
/// maps joint operations onto register writes. Dropping the bus releases the
/// serial device.
pub struct DynamixelBus {
    driver: DynamixelDriver,
}

impl DynamixelBus {
    pub fn open(device: &str, baud_rate: u32) -> Result<Self, BusError> {
        if !SUPPORTED_BAUD_RATES.contains(&baud_rate) {
            return Err(BusError::BaudRateUnsupported(baud_rate));
        }
        let driver = DynamixelDriver::new_with_baud_rate(device, baud_rate).map_err(|e| {
            BusError::DeviceUnavailable {
                device: device.to_string(),
                reason: e.to_string(),
            }
        })?;
        debug!(device, baud_rate, "serial port acquired");
        Ok(Self { driver })
    }
}

fn classify(err: DynamixelDriverError) -> WriteOutcome {
    match err {
        e @ DynamixelDriverError::StatusError(_) => WriteOutcome::DeviceError(e.to_string()),
        e => WriteOutcome::CommunicationFailure(e.to_string()),
    }
}

fn outcome_from(result: Result<(), DynamixelDriverError>) -> WriteOutcome {
    match result {
        Ok(()) => WriteOutcome::Success,
        Err(e) => classify(e),
    }
}

#[async_trait]
impl MotorBus for DynamixelBus {
    async fn probe(&mut self, id: MotorId) -> bool {
        self.driver.ping(id.0).await.is_ok()
    }

    async fn read_position(&mut self, id: MotorId) -> Result<u16, WriteOutcome> {
        match self.driver.read_position(id.0).await {
            Ok(ticks) => Ok(ticks as u16),
            Err(e) => Err(classify(e)),
        }
    }

    async fn set_torque(&mut self, ids: &[MotorId], enabled: bool) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            outcomes.push(outcome_from(self.driver.write_torque(id.0, enabled).await));
        }
        outcomes
    }

    async fn set_moving_speed(&mut self, ids: &[MotorId], speed: u16) -> Vec<WriteOutcome> {
        let commands = ids
            .iter()
            .map(|id| SyncCommand::new(id.0, speed.into()))
            .collect();
        let outcome = outcome_from(self.driver.sync_write_moving_speed(commands).await);
        vec![outcome; ids.len()]
    }

    async fn write_goal_positions(
        &mut self,
        ids: &[MotorId],
        ticks: &[u16],
        mode: WriteMode,
    ) -> Vec<WriteOutcome> {
        debug_assert_eq!(ids.len(), ticks.len());
        match mode {
            WriteMode::FireAndForget => {
                let commands = ids
                    .iter()
                    .zip(ticks)
                    .map(|(id, t)| SyncCommand::new(id.0, (*t).into()))
                    .collect();
                let outcome = outcome_from(self.driver.sync_write_position(commands).await);
                vec![outcome; ids.len()]
            }
            WriteMode::WaitForReply => {
                let mut outcomes = Vec::with_capacity(ids.len());
                for (id, t) in ids.iter().zip(ticks) {
                    outcomes.push(outcome_from(
                        self.driver.write_position(id.0, (*t).into()).await,
                    ));
                }
                outcomes
            }
        }
    }
}
