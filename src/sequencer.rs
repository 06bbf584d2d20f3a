use crate::models::{Beat, Progression};

/// Steps through a [`Progression`] in time, one beat per `60 / bpm` seconds,
/// looping at the end.
pub struct Sequencer {
    progression: Progression,
    start: f32,
    last_beat: Option<u64>,
}

impl Sequencer {
    pub fn new(progression: Progression, start: f32) -> Self {
        Self {
            progression,
            start,
            last_beat: None,
        }
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Play from the first beat again, starting at `now`.
    pub fn restart(&mut self, now: f32) {
        self.start = now;
        self.last_beat = None;
    }

    /// Returns the beat to assign when `now` has entered a new beat.
    pub fn update(&mut self, now: f32) -> Option<&Beat> {
        let beats = &self.progression.beats;
        let bps = self.progression.bpm / 60.0;
        if beats.is_empty() || !bps.is_finite() || bps <= 0.0 {
            return None;
        }
        let elapsed = now - self.start;
        if elapsed.is_nan() || elapsed < 0.0 {
            return None;
        }
        let current = (elapsed * bps) as u64;
        if self.last_beat.is_some_and(|last| current <= last) {
            return None;
        }
        self.last_beat = Some(current);
        Some(&beats[(current % beats.len() as u64) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progression(bpm: f32, n: usize) -> Progression {
        Progression {
            bpm,
            beats: (0..n)
                .map(|i| Beat {
                    frequencies: vec![100.0 * (i + 1) as f32],
                    enabled: None,
                })
                .collect(),
            synth: None,
        }
    }

    fn root(beat: Option<&Beat>) -> Option<f32> {
        beat.map(|b| b.frequencies[0])
    }

    #[test]
    fn test_beats_advance_and_loop() {
        // one beat per second
        let mut seq = Sequencer::new(progression(60.0, 3), 10.0);
        assert_eq!(root(seq.update(9.0)), None);
        assert_eq!(root(seq.update(10.0)), Some(100.0));
        assert_eq!(root(seq.update(10.5)), None);
        assert_eq!(root(seq.update(11.0)), Some(200.0));
        assert_eq!(root(seq.update(12.2)), Some(300.0));
        assert_eq!(root(seq.update(13.1)), Some(100.0));
    }

    #[test]
    fn test_skipped_beats_jump_ahead() {
        let mut seq = Sequencer::new(progression(120.0, 4), 0.0);
        assert_eq!(root(seq.update(0.0)), Some(100.0));
        // 1.6 s at two beats per second is beat 3
        assert_eq!(root(seq.update(1.6)), Some(400.0));
    }

    #[test]
    fn test_restart_and_degenerate_tempo() {
        let mut seq = Sequencer::new(progression(60.0, 2), 0.0);
        assert!(seq.update(1.5).is_some());
        seq.restart(5.0);
        assert_eq!(root(seq.update(5.0)), Some(100.0));

        let mut stalled = Sequencer::new(progression(0.0, 2), 0.0);
        assert!(stalled.update(3.0).is_none());
        let mut empty = Sequencer::new(progression(60.0, 0), 0.0);
        assert!(empty.update(3.0).is_none());
    }
}
