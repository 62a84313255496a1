/// Fixed-capacity window over the last N raw readings of one channel.
///
/// Writes overwrite the oldest slot (index wraps modulo capacity), so the
/// window always holds exactly `capacity` values. Slots that have never
/// been written read as zero, which biases means toward zero during the
/// first partial cycle after power-up; the flight firmware behaved the
/// same way and the warm-up is shorter than one aggregation period.
#[derive(Debug, Clone)]
pub struct RingSampleBuffer<T> {
    slots: Vec<T>,
    write_idx: usize,
    written: usize,
}

impl<T: Copy + Default + Into<f64>> RingSampleBuffer<T> {
    /// Capacity is fixed at construction; no allocation happens per write.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample window needs at least one slot");
        Self {
            slots: vec![T::default(); capacity],
            write_idx: 0,
            written: 0,
        }
    }

    pub fn capacity(&self) -> usize { self.slots.len() }

    /// True once every slot has been written at least once.
    pub fn warmed_up(&self) -> bool { self.written >= self.slots.len() }

    pub fn push(&mut self, value: T) {
        self.slots[self.write_idx] = value;
        self.write_idx = (self.write_idx + 1) % self.slots.len();
        self.written = self.written.saturating_add(1);
    }

    /// Arithmetic mean over the full window, zero-filled slots included.
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.slots.iter().map(|v| (*v).into()).sum();
        sum / self.slots.len() as f64
    }

    /// Most recently written value, if anything was written yet.
    pub fn latest(&self) -> Option<T> {
        if self.written == 0 {
            return None;
        }
        let idx = (self.write_idx + self.slots.len() - 1) % self.slots.len();
        Some(self.slots[idx])
    }
}
