use super::ring_buffer::RingSampleBuffer;
use super::sensors::{AccelSource, BaroSource, BatterySource};
use crate::config::SamplingConfig;
use strum_macros::{Display, EnumIter};

/// Physical quantity a sample window belongs to.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter)]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    Temperature,
    Pressure,
    Battery,
}

/// Fixed-cadence gate, the `millis() - timer >= rate` pattern from the
/// flight firmware. Firing resets the anchor to `now` (not `last + period`),
/// so missed ticks are dropped rather than replayed.
#[derive(Debug, Clone, Copy)]
pub struct CadenceGate {
    period_ms: u64,
    last_ms: u64,
}

impl CadenceGate {
    pub fn new(period_ms: u64) -> Self {
        Self { period_ms, last_ms: 0 }
    }

    pub fn period_ms(&self) -> u64 { self.period_ms }

    /// Rescheduling keeps the current anchor so the next firing happens at
    /// most one new period away.
    pub fn set_period(&mut self, period_ms: u64) { self.period_ms = period_ms; }

    /// Returns true and rearms when a full period has elapsed since the
    /// last firing.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Like [`fire`](Self::fire), but also reports the actually elapsed
    /// time for schedule-overrun accounting.
    pub fn fire_measured(&mut self, now_ms: u64) -> Option<u64> {
        let elapsed = now_ms.saturating_sub(self.last_ms);
        if elapsed >= self.period_ms {
            self.last_ms = now_ms;
            Some(elapsed)
        } else {
            None
        }
    }
}

/// Three-axis accelerometer sampler: one cadence, one window per axis.
pub struct AccelSampler {
    gate: CadenceGate,
    x: RingSampleBuffer<u16>,
    y: RingSampleBuffer<u16>,
    z: RingSampleBuffer<u16>,
}

impl AccelSampler {
    pub fn new(cfg: &SamplingConfig) -> Self {
        Self {
            gate: CadenceGate::new(cfg.cadence_ms),
            x: RingSampleBuffer::new(cfg.window),
            y: RingSampleBuffer::new(cfg.window),
            z: RingSampleBuffer::new(cfg.window),
        }
    }

    /// Samples all three axes when due; returns the raw triple so the
    /// calibration engine can observe the same read.
    pub fn tick(&mut self, now_ms: u64, source: &mut dyn AccelSource) -> Option<[u16; 3]> {
        if !self.gate.fire(now_ms) {
            return None;
        }
        let raw = source.read_axes();
        self.x.push(raw[0]);
        self.y.push(raw[1]);
        self.z.push(raw[2]);
        Some(raw)
    }

    pub fn means(&self) -> [f64; 3] {
        [self.x.mean(), self.y.mean(), self.z.mean()]
    }
}

/// Barometer sampler: temperature and pressure share one cadence because
/// the sensor delivers them as one event. A tick only consumes the gate
/// when the driver actually has fresh data; otherwise the read is retried
/// at the next cadence with no backlog.
pub struct BaroSampler {
    gate: CadenceGate,
    temp_c: RingSampleBuffer<f32>,
    press_pa: RingSampleBuffer<f32>,
}

impl BaroSampler {
    pub fn new(cfg: &SamplingConfig) -> Self {
        Self {
            gate: CadenceGate::new(cfg.cadence_ms),
            temp_c: RingSampleBuffer::new(cfg.window),
            press_pa: RingSampleBuffer::new(cfg.window),
        }
    }

    pub fn tick(&mut self, now_ms: u64, source: &mut dyn BaroSource) -> bool {
        if !source.data_available() || !self.gate.fire(now_ms) {
            return false;
        }
        let event = source.read_event();
        self.temp_c.push(event.temp_c);
        // Driver reports hPa, everything downstream works in Pa.
        self.press_pa.push(event.pressure_hpa * 100.0);
        true
    }

    pub fn mean_temp_c(&self) -> f64 { self.temp_c.mean() }

    pub fn mean_press_pa(&self) -> f64 { self.press_pa.mean() }
}

/// Battery rail sampler, one slow channel.
pub struct BatterySampler {
    gate: CadenceGate,
    raw: RingSampleBuffer<u16>,
}

impl BatterySampler {
    pub fn new(cfg: &SamplingConfig) -> Self {
        Self {
            gate: CadenceGate::new(cfg.cadence_ms),
            raw: RingSampleBuffer::new(cfg.window),
        }
    }

    pub fn tick(&mut self, now_ms: u64, source: &mut dyn BatterySource) -> bool {
        if !self.gate.fire(now_ms) {
            return false;
        }
        self.raw.push(source.read_raw());
        true
    }

    pub fn mean_raw(&self) -> f64 { self.raw.mean() }
}
