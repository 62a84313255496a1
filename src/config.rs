use serde::{Deserialize, Serialize};
use std::path::Path;

/// How averaged raw accelerometer codes become g-force.
///
/// The flight hardware shipped with both conversions wired in; which one is
/// authoritative is a per-vehicle decision, so it is selected here instead
/// of hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccelConversion {
    /// Linear map from the full ADC range onto the sensor's rated g range.
    #[default]
    FixedRange,
    /// Per-axis `(raw - zero) * scale` using the stored self-calibration.
    Calibrated,
}

/// Factory/self-calibration coefficients per accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    /// Raw ADC code at 0 g.
    pub zero_raw: i32,
    /// Raw-to-g scale coefficient.
    pub scale_coef: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelCalibration {
    pub x: AxisCalibration,
    pub y: AxisCalibration,
    pub z: AxisCalibration,
}

impl Default for AccelCalibration {
    /// Bench values measured on the flight ADXL377 before first launch.
    fn default() -> Self {
        Self {
            x: AxisCalibration { zero_raw: 1984, scale_coef: 0.03 },
            y: AxisCalibration { zero_raw: 1984, scale_coef: 0.03 },
            z: AxisCalibration { zero_raw: 1992, scale_coef: 0.029 },
        }
    }
}

/// Per-channel sampling setup: cadence between reads and how many raw
/// samples are averaged into each telemetry entry.
///
/// `cadence_ms * window` must stay <= the fast aggregation cadence so a
/// full window is collected between aggregation ticks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_sample_cadence_ms")]
    pub cadence_ms: u64,
    #[serde(default = "default_sample_window")]
    pub window: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { cadence_ms: default_sample_cadence_ms(), window: default_sample_window() }
    }
}

/// Barometric altitude tunables. These are calibration constants, not
/// physical universals: the lapse rate in particular gets trimmed per
/// launch site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BaroConfig {
    /// Sea-level pressure in Pa.
    #[serde(default = "default_sea_level_pa")]
    pub sea_level_pa: f64,
    /// Lapse-rate-derived exponent in the barometric formula.
    #[serde(default = "default_baro_exponent")]
    pub exponent: f64,
    /// Temperature lapse rate (K/m).
    #[serde(default = "default_lapse_rate")]
    pub lapse_rate: f64,
}

impl Default for BaroConfig {
    fn default() -> Self {
        Self {
            sea_level_pa: default_sea_level_pa(),
            exponent: default_baro_exponent(),
            lapse_rate: default_lapse_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// ADC reference voltage.
    #[serde(default = "default_adc_ref_volts")]
    pub adc_ref_volts: f64,
    /// External divider ratio between the battery rail and the ADC pin.
    #[serde(default = "default_divider_ratio")]
    pub divider_ratio: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self { adc_ref_volts: default_adc_ref_volts(), divider_ratio: default_divider_ratio() }
    }
}

/// Bounded diagnostic startup phase. Never enabled in a flight build; the
/// wait is capped so a missing console cannot hold the logger on the pad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_console_wait_ms")]
    pub console_wait_ms: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self { enabled: false, console_wait_ms: default_console_wait_ms() }
    }
}

/// Full logger configuration, loadable from the JSON file named by
/// `GRAPHITE_CONFIG`. Every field has a flight-proven default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub accel: SamplingConfig,
    pub baro: SamplingConfig,
    pub battery: SamplingConfig,
    /// Aggregation cadence (ms) while armed or in flight.
    pub fast_aggregate_ms: u64,
    /// Aggregation cadence (ms) while idle on the pad.
    pub slow_aggregate_ms: u64,
    /// Wall-clock cap on an accelerometer calibration window (ms).
    pub calibration_timeout_ms: u64,
    /// Status beacon toggle period (ms).
    pub beacon_period_ms: u64,
    /// Extra elapsed time (ms) past the beacon period that counts as a
    /// tick-loop overrun.
    pub beacon_tolerance_ms: u64,
    /// Highest ADC code (12-bit reads everywhere on this board).
    pub adc_max: u16,
    /// Rated accelerometer range in g, symmetric about zero.
    pub accel_range_g: f64,
    pub accel_conversion: AccelConversion,
    pub accel_calibration: AccelCalibration,
    pub baro_constants: BaroConfig,
    pub battery_divider: BatteryConfig,
    pub debug: DebugConfig,
}

fn default_sample_cadence_ms() -> u64 { 5 }
fn default_sample_window() -> usize { 4 }
fn default_sea_level_pa() -> f64 { 101_325.0 }
fn default_baro_exponent() -> f64 { 0.190_266_435_664 }
fn default_lapse_rate() -> f64 { 0.0059 }
fn default_adc_ref_volts() -> f64 { 3.3 }
fn default_divider_ratio() -> f64 { 2.0 }
fn default_console_wait_ms() -> u64 { 10_000 }

impl Default for LoggerConfig {
    fn default() -> Self { Self::flight_defaults() }
}

impl LoggerConfig {
    /// Defaults matching the flight firmware constants.
    pub fn flight_defaults() -> Self {
        Self {
            accel: SamplingConfig::default(),
            baro: SamplingConfig::default(),
            battery: SamplingConfig { cadence_ms: 100, window: 4 },
            fast_aggregate_ms: 20,
            slow_aggregate_ms: 100,
            calibration_timeout_ms: 60_000,
            beacon_period_ms: 1000,
            beacon_tolerance_ms: 3,
            adc_max: 4095,
            accel_range_g: 200.0,
            accel_conversion: AccelConversion::FixedRange,
            accel_calibration: AccelCalibration::default(),
            baro_constants: BaroConfig::default(),
            battery_divider: BatteryConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Loads the file named by `GRAPHITE_CONFIG`, or flight defaults if the
    /// variable is unset. A present-but-broken config is an error rather
    /// than a silent fallback.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("GRAPHITE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => Ok(Self::flight_defaults()),
        }
    }
}

#[derive(Debug, strum_macros::Display)]
pub enum ConfigError {
    #[strum(to_string = "config unreadable: {0}")]
    Unreadable(String),
    #[strum(to_string = "config invalid: {0}")]
    Invalid(String),
}

impl std::error::Error for ConfigError {}
