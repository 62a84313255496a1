use crate::warn;
use strum_macros::Display;

/// One barometer delivery: the DPS310-class parts report temperature and
/// pressure together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaroEvent {
    pub temp_c: f32,
    /// Driver-native hPa; the sampler converts to Pa on store.
    pub pressure_hpa: f32,
}

/// High-g analog accelerometer boundary. Reads are plain ADC codes at the
/// board's fixed resolution and never fail: an analog pin always converts.
pub trait AccelSource: Send + Sync {
    /// Raw 12-bit codes for the X, Y and Z pins, in that order.
    fn read_axes(&mut self) -> [u16; 3];
}

/// Barometric sensor boundary with the explicit availability predicate the
/// tick loop checks before consuming a cadence slot.
pub trait BaroSource: Send + Sync {
    /// One bounded connection attempt. Called repeatedly by
    /// [`init_baro`]; a transport hiccup here is recoverable.
    fn try_connect(&mut self) -> Result<(), String>;

    /// Whether the sensor has produced a sample since the last read.
    fn data_available(&self) -> bool;

    /// Consumes the pending sample. Only call after `data_available()`.
    fn read_event(&mut self) -> BaroEvent;
}

/// Battery rail ADC boundary.
pub trait BatterySource: Send + Sync {
    fn read_raw(&mut self) -> u16;
}

/// The full sensor complement behind the acquisition pipeline.
pub struct SensorSuite {
    pub accel: Box<dyn AccelSource>,
    pub baro: Box<dyn BaroSource>,
    pub battery: Box<dyn BatterySource>,
}

/// Init failures after bounded retries are fatal: flying with a dead
/// sensor would log corrupt data, so the caller halts into the failure
/// beacon instead of continuing.
#[derive(Debug, Display)]
pub enum InitError {
    #[strum(to_string = "sensor init failed after {attempts} attempts: {name}")]
    SensorUnreachable { name: &'static str, attempts: u32 },
}

impl std::error::Error for InitError {}

pub const BARO_INIT_ATTEMPTS: u32 = 10;

/// Brings up the barometer, retrying the connection a bounded number of
/// times before escalating.
pub fn init_baro(source: &mut dyn BaroSource) -> Result<(), InitError> {
    for attempt in 1..=BARO_INIT_ATTEMPTS {
        match source.try_connect() {
            Ok(()) => return Ok(()),
            Err(e) => warn!("baro init attempt {attempt}/{BARO_INIT_ATTEMPTS} failed: {e}"),
        }
    }
    Err(InitError::SensorUnreachable { name: "baro", attempts: BARO_INIT_ATTEMPTS })
}
