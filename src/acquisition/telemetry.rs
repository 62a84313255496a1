use super::channel_sampler::{AccelSampler, BaroSampler, BatterySampler, CadenceGate};
use crate::config::{AccelCalibration, AccelConversion, AxisCalibration, LoggerConfig};
use serde::Serialize;

pub const STANDARD_GRAVITY: f64 = 9.80665;
pub const M_TO_FT: f64 = 3.280_839_895;
pub const C_TO_K_OFFSET: f64 = 273.15;

/// `map()` but over f64, same shape as the firmware's `mapf`.
pub fn map_range(num: f64, from_lo: f64, from_hi: f64, to_lo: f64, to_hi: f64) -> f64 {
    (num - from_lo) * (to_hi - to_lo) / (from_hi - from_lo) + to_lo
}

pub fn temp_c_to_f(temp_c: f64) -> f64 { temp_c * 1.8 + 32.0 }

pub fn temp_c_to_k(temp_c: f64) -> f64 { temp_c + C_TO_K_OFFSET }

/// Barometric altitude from averaged pressure and temperature:
/// `(((P0/P)^exp - 1) * T_K) / lapse_rate`. All three constants are
/// launch-site tunables from [`BaroConfig`](crate::config::BaroConfig).
pub fn baro_altitude_m(press_pa: f64, temp_k: f64, sea_level_pa: f64, exponent: f64, lapse_rate: f64) -> f64 {
    (((sea_level_pa / press_pa).powf(exponent)) - 1.0) * temp_k / lapse_rate
}

/// Averaged, unit-converted telemetry snapshot. Recomputed wholesale each
/// aggregation tick; field names match the ground client's status payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalReading {
    // The ground client's payload names the raw averages xAccel/yAccel/
    // zAccel, with the converted values suffixed.
    #[serde(rename = "xAccel")]
    pub x_accel_raw: f64,
    #[serde(rename = "yAccel")]
    pub y_accel_raw: f64,
    #[serde(rename = "zAccel")]
    pub z_accel_raw: f64,
    pub x_accel_g: f64,
    pub y_accel_g: f64,
    pub z_accel_g: f64,
    pub x_accel_ms2: f64,
    pub y_accel_ms2: f64,
    pub z_accel_ms2: f64,
    pub temp_c: f64,
    pub temp_f: f64,
    pub temp_k: f64,
    pub press_pa: f64,
    pub alt_m: f64,
    pub alt_ft: f64,
    pub batt_v: f64,
}

/// Converts averaged raw windows into a [`PhysicalReading`] on its own
/// cadence. The cadence is not owned here: the flight state machine picks
/// fast or slow and the recorder pushes it in on transitions.
pub struct TelemetryAggregator {
    gate: CadenceGate,
    adc_max: f64,
    accel_range_g: f64,
    conversion: AccelConversion,
    sea_level_pa: f64,
    baro_exponent: f64,
    lapse_rate: f64,
    adc_ref_volts: f64,
    divider_ratio: f64,
    latest: PhysicalReading,
}

impl TelemetryAggregator {
    pub fn new(cfg: &LoggerConfig) -> Self {
        Self {
            gate: CadenceGate::new(cfg.slow_aggregate_ms),
            adc_max: f64::from(cfg.adc_max),
            accel_range_g: cfg.accel_range_g,
            conversion: cfg.accel_conversion,
            sea_level_pa: cfg.baro_constants.sea_level_pa,
            baro_exponent: cfg.baro_constants.exponent,
            lapse_rate: cfg.baro_constants.lapse_rate,
            adc_ref_volts: cfg.battery_divider.adc_ref_volts,
            divider_ratio: cfg.battery_divider.divider_ratio,
            latest: PhysicalReading::default(),
        }
    }

    pub fn set_cadence(&mut self, period_ms: u64) { self.gate.set_period(period_ms); }

    pub fn cadence_ms(&self) -> u64 { self.gate.period_ms() }

    pub fn latest(&self) -> PhysicalReading { self.latest }

    fn raw_to_g(&self, raw: f64, axis: &AxisCalibration) -> f64 {
        match self.conversion {
            AccelConversion::FixedRange => {
                map_range(raw, 0.0, self.adc_max, -self.accel_range_g, self.accel_range_g)
            }
            AccelConversion::Calibrated => (raw - f64::from(axis.zero_raw)) * axis.scale_coef,
        }
    }

    pub fn battery_volts(&self, raw: f64) -> f64 {
        raw / self.adc_max * self.adc_ref_volts * self.divider_ratio
    }

    /// Recomputes the snapshot from the current windows when the cadence
    /// is due. Every conversion is a pure function of the averaged inputs.
    pub fn tick(
        &mut self,
        now_ms: u64,
        accel: &AccelSampler,
        baro: &BaroSampler,
        battery: &BatterySampler,
        calibration: &AccelCalibration,
    ) -> bool {
        if !self.gate.fire(now_ms) {
            return false;
        }

        let [x_raw, y_raw, z_raw] = accel.means();
        let x_g = self.raw_to_g(x_raw, &calibration.x);
        let y_g = self.raw_to_g(y_raw, &calibration.y);
        let z_g = self.raw_to_g(z_raw, &calibration.z);

        let temp_c = baro.mean_temp_c();
        let temp_k = temp_c_to_k(temp_c);
        let press_pa = baro.mean_press_pa();
        let alt_m = baro_altitude_m(
            press_pa,
            temp_k,
            self.sea_level_pa,
            self.baro_exponent,
            self.lapse_rate,
        );

        self.latest = PhysicalReading {
            x_accel_raw: x_raw,
            y_accel_raw: y_raw,
            z_accel_raw: z_raw,
            x_accel_g: x_g,
            y_accel_g: y_g,
            z_accel_g: z_g,
            x_accel_ms2: x_g * STANDARD_GRAVITY,
            y_accel_ms2: y_g * STANDARD_GRAVITY,
            z_accel_ms2: z_g * STANDARD_GRAVITY,
            temp_c,
            temp_f: temp_c_to_f(temp_c),
            temp_k,
            press_pa,
            alt_m,
            alt_ft: alt_m * M_TO_FT,
            batt_v: self.battery_volts(battery.mean_raw()),
        };
        true
    }
}
