use crate::acquisition::{AccelSource, BaroEvent, BaroSource, BatterySource};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};

/// Bench stand-ins for the flight sensors, used when the binary runs on a
/// host without the airframe attached. Values hover around realistic
/// pad-idle readings with a little ADC noise.
pub struct BenchAccel {
    /// Raw codes at rest, Z axis sitting at +1 g.
    rest: [i32; 3],
    noise: i32,
}

impl Default for BenchAccel {
    fn default() -> Self {
        Self { rest: [1984, 1984, 2037], noise: 6 }
    }
}

impl AccelSource for BenchAccel {
    fn read_axes(&mut self) -> [u16; 3] {
        let mut rng = rand::rng();
        let mut axes = [0_u16; 3];
        for (slot, rest) in axes.iter_mut().zip(self.rest) {
            *slot = (rest + rng.random_range(-self.noise..=self.noise)).clamp(0, 4095) as u16;
        }
        axes
    }
}

/// Simulated barometer. `flaky_connects` failed attempts before init
/// succeeds exercise the bounded-retry path; data is available on every
/// other poll, the way a real part outpaced by the tick loop behaves.
pub struct BenchBaro {
    temp_c: f32,
    pressure_hpa: f32,
    flaky_connects: u32,
    pending: AtomicBool,
}

impl Default for BenchBaro {
    fn default() -> Self {
        Self {
            temp_c: 21.5,
            pressure_hpa: 1013.25,
            flaky_connects: 0,
            pending: AtomicBool::new(true),
        }
    }
}

impl BenchBaro {
    pub fn flaky(attempts: u32) -> Self {
        Self { flaky_connects: attempts, ..Self::default() }
    }
}

impl BaroSource for BenchBaro {
    fn try_connect(&mut self) -> Result<(), String> {
        if self.flaky_connects > 0 {
            self.flaky_connects -= 1;
            return Err(String::from("no I2C ack"));
        }
        Ok(())
    }

    fn data_available(&self) -> bool {
        // One empty poll after every read, then fresh data again.
        if self.pending.load(Ordering::Relaxed) {
            true
        } else {
            self.pending.store(true, Ordering::Relaxed);
            false
        }
    }

    fn read_event(&mut self) -> BaroEvent {
        self.pending.store(false, Ordering::Relaxed);
        let mut rng = rand::rng();
        BaroEvent {
            temp_c: self.temp_c + rng.random_range(-0.05..=0.05),
            pressure_hpa: self.pressure_hpa + rng.random_range(-0.2..=0.2),
        }
    }
}

/// Battery rail around 4.0 V through the 2:1 divider.
pub struct BenchBattery {
    rest: i32,
    noise: i32,
}

impl Default for BenchBattery {
    fn default() -> Self {
        Self { rest: 2482, noise: 4 }
    }
}

impl BatterySource for BenchBattery {
    fn read_raw(&mut self) -> u16 {
        let mut rng = rand::rng();
        (self.rest + rng.random_range(-self.noise..=self.noise)).clamp(0, 4095) as u16
    }
}
