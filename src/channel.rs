/// Number of synthesis voices (root, third, fifth, seventh, ninth).
pub const NUM_CHANNELS: usize = 5;

/// One synthesis voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    /// Hz; zero is silent.
    pub frequency: f32,
    pub enabled: bool,
    /// Fractional cycle one sample past the last rendered sample.
    phase_progress: f64,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            frequency: 0.0,
            enabled: true,
            phase_progress: 0.0,
        }
    }
}

impl Channel {
    pub fn phase_progress(&self) -> f64 {
        self.phase_progress
    }

    /// Cycles advanced per output sample, including the vibrato shift.
    pub fn phase_increment(&self, shift: f32, sample_rate: f32) -> f64 {
        (self.frequency as f64 + shift as f64) / sample_rate as f64
    }

    /// Phase in cycles of the `index`th sample of the current block.
    #[inline]
    pub fn cycles_at(&self, increment: f64, index: usize) -> f64 {
        self.phase_progress + increment * index as f64
    }

    /// Commit the phase reached after rendering `len` samples.
    pub fn advance(&mut self, increment: f64, len: usize) {
        self.phase_progress = self.cycles_at(increment, len).rem_euclid(1.0);
        if !self.phase_progress.is_finite() || self.phase_progress >= 1.0 {
            self.phase_progress = 0.0;
        }
    }
}
