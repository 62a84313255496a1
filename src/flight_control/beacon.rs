use crate::acquisition::CadenceGate;

/// Result of one beacon toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconToggle {
    pub lit: bool,
    /// Set when the toggle fired later than period + tolerance: the
    /// cooperative loop is running behind its timing budget. This is the
    /// system's only overrun signal.
    pub overrun_ms: Option<u64>,
}

/// Liveness beacon: flips the status indicator on a fixed period and
/// watches its own schedule.
pub struct LivenessBeacon {
    gate: CadenceGate,
    tolerance_ms: u64,
    lit: bool,
}

impl LivenessBeacon {
    pub fn new(period_ms: u64, tolerance_ms: u64) -> Self {
        Self {
            gate: CadenceGate::new(period_ms),
            tolerance_ms,
            lit: true,
        }
    }

    pub fn is_lit(&self) -> bool { self.lit }

    pub fn tick(&mut self, now_ms: u64) -> Option<BeaconToggle> {
        let elapsed = self.gate.fire_measured(now_ms)?;
        self.lit = !self.lit;
        let budget = self.gate.period_ms() + self.tolerance_ms;
        Some(BeaconToggle {
            lit: self.lit,
            overrun_ms: (elapsed > budget).then(|| elapsed - self.gate.period_ms()),
        })
    }
}
