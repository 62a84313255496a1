mod beacon;
mod flight_recorder;
mod flight_state;
mod supervisor;
mod time_sync;
#[cfg(test)]
mod tests;

pub use beacon::{BeaconToggle, LivenessBeacon};
pub use flight_recorder::{CommandError, FlightRecorder, LoggerEvent, StatusSnapshot};
pub use flight_state::FlightState;
pub use supervisor::{GroundCommand, Supervisor};
pub use time_sync::{parse_client_time, DeviceClock, TimeSyncError, TimeSyncResult};
