//! Deterministic noise helpers for synthetic datasets.
//!
//! No RNG crate is involved, so synthetic datasets stay stable across
//! versions and platforms.

use crate::{CheckerObservations, Real, Vec2};

/// Deterministic uniform noise in `[-max_abs, +max_abs]` on `(k, l)` samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformSampleNoise {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum absolute per-axis noise (pixels).
    pub max_abs: Real,
}

impl UniformSampleNoise {
    /// Sample a noise vector for a `(pose, view, corner)` key, where `view`
    /// is the flattened sub-aperture index.
    #[inline]
    pub fn sample(&self, pose: usize, view: usize, corner: usize) -> Vec2 {
        let max_abs = self.max_abs.abs();
        if max_abs == 0.0 {
            return Vec2::zeros();
        }

        let key = mix_key(self.seed, pose, view, corner);
        let u = u64_to_unit_f64(splitmix64(key));
        let v = u64_to_unit_f64(splitmix64(key ^ 0x94D0_49BB_1331_11EB));

        // [0, 1) -> [-max_abs, +max_abs]
        Vec2::new((u - 0.5) * 2.0 * max_abs, (v - 0.5) * 2.0 * max_abs)
    }

    /// Perturb every detected corner in place.
    pub fn apply(&self, obs: &mut CheckerObservations) {
        let cols = obs.cols();
        for (pose, j, i, corners) in obs.cells_mut() {
            for (c, p) in corners.iter_mut().enumerate() {
                *p += self.sample(pose, j * cols + i, c);
            }
        }
    }
}

#[inline]
fn mix_key(seed: u64, pose: usize, view: usize, corner: usize) -> u64 {
    seed ^ (pose as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (view as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ (corner as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Top 53 bits as a double in `[0, 1)`.
#[inline]
fn u64_to_unit_f64(x: u64) -> Real {
    let mantissa = x >> 11;
    (mantissa as Real) * (1.0 / ((1u64 << 53) as Real))
}
