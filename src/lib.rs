pub mod bus;
pub mod config;
pub mod decoder;
pub mod error;
pub mod model;
pub mod session;
pub mod transport_dynamixel;

pub use bus::{MotorBus, WriteMode, WriteOutcome};
pub use config::ServerConfig;
pub use decoder::{decode_goal_line, is_quit};
pub use error::{BusError, ConfigError, DecodeError};
pub use model::{clamp_position, MotorId, POSITION_MAX, POSITION_MIN};
pub use session::{run_session, BracketReport, ExitReason, RateSample, SessionStats, SessionSummary};
pub use transport_dynamixel::DynamixelBus;
