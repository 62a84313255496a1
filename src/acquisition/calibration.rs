use crate::config::{AccelCalibration, AxisCalibration};
use strum_macros::Display;

/// Observed raw extremes for one axis during an active calibration window.
#[derive(Debug, Clone, Copy)]
struct AxisWindow {
    min: i32,
    max: i32,
}

impl AxisWindow {
    fn seed(raw: u16) -> Self {
        Self { min: i32::from(raw), max: i32::from(raw) }
    }

    fn observe(&mut self, raw: u16) {
        let raw = i32::from(raw);
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
    }

    /// `scale = 2 / (max - min)`, `zero = max - (max - min) / 2`.
    /// A window with no dynamic range has no defined scale.
    fn finish(self) -> Result<AxisCalibration, CalibrationError> {
        let range = self.max - self.min;
        if range == 0 {
            return Err(CalibrationError::ZeroRange { observed: self.max });
        }
        Ok(AxisCalibration {
            zero_raw: self.max - range / 2,
            scale_coef: 2.0 / f64::from(range),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CalibrationError {
    /// `max == min` on at least one axis; the 2/(max-min) scale would
    /// divide by zero. The previous calibration stays in effect.
    #[strum(to_string = "no dynamic range observed (flat at {observed})")]
    ZeroRange { observed: i32 },
    #[strum(to_string = "calibration not active")]
    NotActive,
    #[strum(to_string = "calibration already active")]
    AlreadyActive,
}

impl std::error::Error for CalibrationError {}

enum EngineState {
    Inactive,
    /// Armed but waiting for the first accelerometer read to seed min/max.
    AwaitingSeed { deadline_ms: u64 },
    Active {
        deadline_ms: u64,
        x: AxisWindow,
        y: AxisWindow,
        z: AxisWindow,
    },
}

/// Bounded-duration accelerometer self-calibration.
///
/// While active, every raw triple the sampler produces widens the per-axis
/// min/max window (the operator rolls the airframe through ±1 g on each
/// axis). The window closes on an explicit stop or on the wall-clock
/// timeout, whichever comes first, and the coefficients are derived from
/// the final extremes.
pub struct CalibrationEngine {
    timeout_ms: u64,
    state: EngineState,
}

impl CalibrationEngine {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms, state: EngineState::Inactive }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, EngineState::Inactive)
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), CalibrationError> {
        if self.is_active() {
            return Err(CalibrationError::AlreadyActive);
        }
        self.state = EngineState::AwaitingSeed { deadline_ms: now_ms + self.timeout_ms };
        Ok(())
    }

    /// Feeds one raw accelerometer triple. The very first triple after
    /// `start` seeds min = max = raw; later triples only widen the window.
    pub fn observe(&mut self, raw: [u16; 3]) {
        if let EngineState::AwaitingSeed { deadline_ms } = self.state {
            self.state = EngineState::Active {
                deadline_ms,
                x: AxisWindow::seed(raw[0]),
                y: AxisWindow::seed(raw[1]),
                z: AxisWindow::seed(raw[2]),
            };
            return;
        }
        if let EngineState::Active { x, y, z, .. } = &mut self.state {
            x.observe(raw[0]);
            y.observe(raw[1]);
            z.observe(raw[2]);
        }
    }

    /// Deactivates on timeout. Returns the derived calibration when the
    /// window just closed; callers decide what to do with a rejection.
    pub fn tick(&mut self, now_ms: u64) -> Option<Result<AccelCalibration, CalibrationError>> {
        let deadline = match self.state {
            EngineState::Inactive => return None,
            EngineState::AwaitingSeed { deadline_ms } | EngineState::Active { deadline_ms, .. } => {
                deadline_ms
            }
        };
        if now_ms < deadline {
            return None;
        }
        Some(self.stop())
    }

    /// External stop signal; also the shared exit path for the timeout.
    pub fn stop(&mut self) -> Result<AccelCalibration, CalibrationError> {
        match std::mem::replace(&mut self.state, EngineState::Inactive) {
            EngineState::Inactive => Err(CalibrationError::NotActive),
            // Never saw a sample: an empty window has no range at all.
            EngineState::AwaitingSeed { .. } => {
                Err(CalibrationError::ZeroRange { observed: 0 })
            }
            EngineState::Active { x, y, z, .. } => Ok(AccelCalibration {
                x: x.finish()?,
                y: y.finish()?,
                z: z.finish()?,
            }),
        }
    }
}
