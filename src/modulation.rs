//! Control-rate modulation: envelope, vibrato, duty cycle and harmonic drift.
//!
//! Everything here is driven by an explicit `now` in seconds since the
//! engine started, so the same inputs always yield the same frame.

use std::f32::consts::TAU;

use crate::config::SynthDefaults;

/// Values produced by one control tick and consumed by the render path
/// as a single unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationFrame {
    pub volume: f32,
    /// Hz added to every channel's frequency.
    pub shift: f32,
    pub duty: f32,
    pub harmonic_offset: f32,
}

impl Default for ModulationFrame {
    fn default() -> Self {
        Self {
            volume: 1.0,
            shift: 0.0,
            duty: 0.5,
            harmonic_offset: 0.0,
        }
    }
}

/// Replace NaN and infinities with `fallback`.
pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Non-negative, finite seconds or Hz.
pub(crate) fn non_negative(value: f32) -> f32 {
    finite_or(value, 0.0).max(0.0)
}

#[derive(Debug, Clone)]
pub struct Modulator {
    envelope_start: f32,
    attack: f32,
    release: f32,
    vibrato_depth: f32,
    vibrato_rate: f32,
    harmonic_velocity: f32,
    duty_offset: f32,
    duty_rate: f32,
    frame: ModulationFrame,
}

impl Modulator {
    pub fn new(defaults: &SynthDefaults) -> Self {
        let mut m = Self {
            envelope_start: 0.0,
            attack: 0.0,
            release: 0.0,
            vibrato_depth: 0.0,
            vibrato_rate: 0.0,
            harmonic_velocity: 0.0,
            duty_offset: 0.5,
            duty_rate: 0.0,
            frame: ModulationFrame::default(),
        };
        m.set_attack(defaults.attack);
        m.set_release(defaults.release);
        m.set_vibrato_depth(defaults.vibrato_depth);
        m.set_vibrato_rate(defaults.vibrato_rate);
        m.set_harmonic_velocity(defaults.harmonic_velocity);
        m.set_duty_offset(defaults.duty_offset);
        m.set_duty_rate(defaults.duty_rate);
        m.frame.duty = m.duty_offset;
        m
    }

    pub fn frame(&self) -> ModulationFrame {
        self.frame
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.attack = non_negative(seconds);
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.release = non_negative(seconds);
    }

    /// Depth may be negative, which only inverts the vibrato phase.
    pub fn set_vibrato_depth(&mut self, hz: f32) {
        self.vibrato_depth = finite_or(hz, 0.0);
    }

    pub fn set_vibrato_rate(&mut self, hz: f32) {
        self.vibrato_rate = non_negative(hz);
    }

    pub fn set_harmonic_velocity(&mut self, velocity: f32) {
        self.harmonic_velocity = finite_or(velocity, 0.0);
    }

    pub fn set_duty_offset(&mut self, width: f32) {
        self.duty_offset = finite_or(width, 0.5).clamp(0.0, 1.0);
    }

    pub fn set_duty_rate(&mut self, hz: f32) {
        self.duty_rate = non_negative(hz);
    }

    pub fn duty_offset(&self) -> f32 {
        self.duty_offset
    }

    /// Start a new envelope at `now`.
    pub fn reset_envelope(&mut self, now: f32) {
        self.envelope_start = finite_or(now, 0.0);
    }

    /// Linear attack to full level, then linear release to silence.
    pub fn attack_release(&mut self, now: f32) -> f32 {
        let elapsed = now - self.envelope_start;
        let volume = if elapsed < self.attack {
            elapsed / self.attack
        } else if self.release > 0.0 {
            (self.release - (elapsed - self.attack)) / self.release
        } else {
            0.0
        };
        self.frame.volume = finite_or(volume, 0.0).clamp(0.0, 1.0);
        self.frame.volume
    }

    pub fn vibrato(&mut self, now: f32) -> f32 {
        self.frame.shift = self.vibrato_depth * (TAU * self.vibrato_rate * now).sin();
        self.frame.shift
    }

    pub fn harmonics_drift(&mut self) -> f32 {
        // amplitudes only depend on the offset modulo 2π
        self.frame.harmonic_offset =
            finite_or(self.frame.harmonic_offset + self.harmonic_velocity, 0.0).rem_euclid(TAU);
        self.frame.harmonic_offset
    }

    pub fn duty_update(&mut self, now: f32) -> f32 {
        let duty = if self.duty_rate == 0.0 {
            self.duty_offset
        } else {
            0.5 + 0.4 * (TAU * self.duty_rate * now).sin()
        };
        self.frame.duty = duty.clamp(0.0, 1.0);
        self.frame.duty
    }

    /// Run every controller once and return the resulting frame.
    pub fn tick(&mut self, now: f32) -> ModulationFrame {
        self.duty_update(now);
        self.harmonics_drift();
        self.attack_release(now);
        self.vibrato(now);
        self.frame
    }
}
