//! Table-driven sine/cosine used by the render path.

use std::f32::consts::TAU;

pub const SIN_RESOLUTION: usize = 1024;
pub const COS_RESOLUTION: usize = 256;

/// Reduce a phase in radians to its fractional cycle in `[0, 1)`.
///
/// Negative phases wrap forward, so `-π/2` maps to `0.75`.
#[inline]
pub fn frac_cycle(x: f32) -> f32 {
    let u = (x / TAU).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if u >= 1.0 {
        0.0
    } else {
        u
    }
}

/// Precomputed sine and cosine tables.
///
/// Built once per engine before the first render; immutable afterwards.
#[derive(Debug, Clone)]
pub struct LookupTables {
    sin: [f32; SIN_RESOLUTION],
    cos: [f32; COS_RESOLUTION],
}

impl LookupTables {
    pub fn new() -> Self {
        let mut sin = [0.0f32; SIN_RESOLUTION];
        for (i, v) in sin.iter_mut().enumerate() {
            *v = (i as f32 / SIN_RESOLUTION as f32 * TAU).sin();
        }
        let mut cos = [0.0f32; COS_RESOLUTION];
        for (i, v) in cos.iter_mut().enumerate() {
            *v = (i as f32 / COS_RESOLUTION as f32 * TAU).cos();
        }
        Self { sin, cos }
    }

    #[inline]
    pub fn sin_lookup(&self, x: f32) -> f32 {
        self.sin[table_index(x, SIN_RESOLUTION)]
    }

    #[inline]
    pub fn cos_lookup(&self, x: f32) -> f32 {
        self.cos[table_index(x, COS_RESOLUTION)]
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn table_index(x: f32, len: usize) -> usize {
    let idx = (frac_cycle(x) * len as f32) as usize;
    // frac_cycle < 1.0 but the product can still round to len
    idx.min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_match_std_at_entries() {
        let tables = LookupTables::new();
        for i in 0..SIN_RESOLUTION {
            let x = i as f32 / SIN_RESOLUTION as f32 * TAU;
            assert!((tables.sin_lookup(x) - x.sin()).abs() < 1e-2, "sin entry {i}");
        }
        for i in 0..COS_RESOLUTION {
            let x = i as f32 / COS_RESOLUTION as f32 * TAU;
            assert!((tables.cos_lookup(x) - x.cos()).abs() < 5e-2, "cos entry {i}");
        }
    }

    #[test]
    fn test_sin_lookup_is_periodic() {
        let tables = LookupTables::new();
        // phases chosen away from table cell boundaries
        for &x in &[0.1f32, 1.0, 2.5, 4.0, 5.9] {
            for k in -3i32..=3 {
                let shifted = x + TAU * k as f32;
                assert_eq!(
                    tables.sin_lookup(x),
                    tables.sin_lookup(shifted),
                    "x = {x}, k = {k}"
                );
            }
        }
    }

    #[test]
    fn test_negative_phase_wraps() {
        let u = frac_cycle(-std::f32::consts::FRAC_PI_2);
        assert!((u - 0.75).abs() < 1e-6);
        let tables = LookupTables::new();
        assert!((tables.sin_lookup(-std::f32::consts::FRAC_PI_2) + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_huge_phase_stays_in_bounds() {
        let tables = LookupTables::new();
        for &x in &[1.0e9f32, -1.0e9, f32::MAX / 2.0] {
            let v = tables.sin_lookup(x);
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}
