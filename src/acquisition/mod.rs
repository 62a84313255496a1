mod calibration;
mod channel_sampler;
mod ring_buffer;
pub(crate) mod sensors;
mod telemetry;

pub use calibration::{CalibrationEngine, CalibrationError};
pub use channel_sampler::{AccelSampler, BaroSampler, BatterySampler, CadenceGate, Channel};
pub use ring_buffer::RingSampleBuffer;
pub use sensors::{
    init_baro, AccelSource, BaroEvent, BaroSource, BatterySource, InitError, SensorSuite,
};
pub use telemetry::{
    baro_altitude_m, map_range, temp_c_to_f, temp_c_to_k, PhysicalReading, TelemetryAggregator,
    M_TO_FT, STANDARD_GRAVITY,
};
