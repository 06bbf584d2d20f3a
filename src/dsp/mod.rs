pub mod trig;

use trig::{frac_cycle, LookupTables};

pub const SINE: u8 = 0b0001;
pub const SQUARE: u8 = 0b0010;
pub const SAWTOOTH: u8 = 0b0100;
pub const TRIANGLE: u8 = 0b1000;
pub const ALL_WAVEFORMS: u8 = SINE | SQUARE | SAWTOOTH | TRIANGLE;

pub const MAX_HARMONICS: usize = 8;
pub const HARMONIC_DECAY: f32 = 0.75;

// Relative levels so that stacking shapes does not trivially clip.
const SINE_GAIN: f32 = 1.0;
const SQUARE_GAIN: f32 = 0.25;
const SAWTOOTH_GAIN: f32 = 0.3;
const TRIANGLE_GAIN: f32 = 0.6;

pub fn sine_wave(tables: &LookupTables, x: f32) -> f32 {
    tables.sin_lookup(x)
}

/// Pulse wave; `duty` below 0.5 narrows the high part of the cycle.
pub fn square_wave(x: f32, duty: f32) -> f32 {
    if frac_cycle(x) < duty {
        1.0
    } else {
        -1.0
    }
}

pub fn sawtooth_wave(x: f32) -> f32 {
    2.0 * frac_cycle(x) - 1.0
}

pub fn triangle_wave(x: f32) -> f32 {
    let u = frac_cycle(x);
    if u < 0.5 {
        4.0 * u - 1.0
    } else {
        -4.0 * u + 3.0
    }
}

/// Sum every waveform enabled in `mask` at phase `x`.
pub fn wave(tables: &LookupTables, x: f32, mask: u8, duty: f32) -> f32 {
    let mut mix = 0.0;
    if mask & SINE != 0 {
        mix += sine_wave(tables, x) * SINE_GAIN;
    }
    if mask & SQUARE != 0 {
        mix += square_wave(x, duty) * SQUARE_GAIN;
    }
    if mask & SAWTOOTH != 0 {
        mix += sawtooth_wave(x) * SAWTOOTH_GAIN;
    }
    if mask & TRIANGLE != 0 {
        mix += triangle_wave(x) * TRIANGLE_GAIN;
    }
    mix
}

/// Fundamental plus `amplitudes.len() - 1` overtones, each decaying by
/// [`HARMONIC_DECAY`] relative to the one below.
pub fn wave_harmonics(
    tables: &LookupTables,
    x: f32,
    mask: u8,
    duty: f32,
    amplitudes: &[f32],
) -> f32 {
    let mut mix = 0.0;
    let mut level = 1.0;
    for (k, amp) in amplitudes.iter().enumerate() {
        mix += wave(tables, (k + 1) as f32 * x, mask, duty) * amp * level;
        level *= HARMONIC_DECAY;
    }
    mix
}

/// Per-harmonic weights for one render block.
///
/// Returns the filled prefix of `out`; `count` is clamped to the array size.
pub fn harmonic_amplitudes<'a>(
    tables: &LookupTables,
    harmonic_offset: f32,
    count: usize,
    out: &'a mut [f32; MAX_HARMONICS],
) -> &'a [f32] {
    let count = count.clamp(1, MAX_HARMONICS);
    for (k, amp) in out.iter_mut().enumerate().take(count) {
        let k = k as f32;
        *amp = tables.cos_lookup(k * harmonic_offset + k);
    }
    &out[..count]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn at(u: f32) -> f32 {
        u * TAU
    }

    #[test]
    fn test_square_respects_duty() {
        assert_eq!(square_wave(at(0.2), 0.25), 1.0);
        assert_eq!(square_wave(at(0.3), 0.25), -1.0);
        assert_eq!(square_wave(at(0.3), 0.5), 1.0);
        assert_eq!(square_wave(at(0.1), 0.0), -1.0);
        assert_eq!(square_wave(at(0.9), 1.0), 1.0);
    }

    #[test]
    fn test_sawtooth_ramp() {
        assert!((sawtooth_wave(at(0.0)) + 1.0).abs() < 1e-6);
        assert!(sawtooth_wave(at(0.5)).abs() < 1e-5);
        assert!((sawtooth_wave(at(0.75)) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_shape() {
        assert!((triangle_wave(at(0.0)) + 1.0).abs() < 1e-6);
        assert!(triangle_wave(at(0.25)).abs() < 1e-5);
        assert!((triangle_wave(at(0.5)) - 1.0).abs() < 1e-5);
        assert!(triangle_wave(at(0.75)).abs() < 1e-5);
        for i in 0..100 {
            let v = triangle_wave(at(i as f32 / 100.0));
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_wave_mask_weights() {
        let tables = LookupTables::new();
        let x = at(0.1);
        assert_eq!(wave(&tables, x, 0, 0.5), 0.0);
        assert!((wave(&tables, x, SQUARE, 0.5) - 0.25).abs() < 1e-6);
        let expected =
            tables.sin_lookup(x) + 0.25 + sawtooth_wave(x) * 0.3 + triangle_wave(x) * 0.6;
        assert!((wave(&tables, x, ALL_WAVEFORMS, 0.5) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_harmonics_decay_geometrically() {
        let tables = LookupTables::new();
        let x = at(0.1);
        let amps = [1.0f32, 1.0, 1.0];
        let expected = wave(&tables, x, SQUARE, 0.5)
            + wave(&tables, 2.0 * x, SQUARE, 0.5) * 0.75
            + wave(&tables, 3.0 * x, SQUARE, 0.5) * 0.5625;
        assert!((wave_harmonics(&tables, x, SQUARE, 0.5, &amps) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_harmonic_amplitudes_clamped() {
        let tables = LookupTables::new();
        let mut buf = [0.0f32; MAX_HARMONICS];
        assert_eq!(harmonic_amplitudes(&tables, 0.0, 0, &mut buf).len(), 1);
        assert_eq!(harmonic_amplitudes(&tables, 0.0, 100, &mut buf).len(), MAX_HARMONICS);
        let amps = harmonic_amplitudes(&tables, 0.0, 3, &mut buf);
        // fundamental weight is cos(0)
        assert!((amps[0] - 1.0).abs() < 1e-6);
        assert!((amps[1] - tables.cos_lookup(1.0)).abs() < 1e-6);
    }
}
