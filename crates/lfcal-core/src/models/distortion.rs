use crate::{Real, Vec2};
use serde::{Deserialize, Serialize};

/// Radial distortion of the ray direction `(u, v)` about a centre `(b1, b2)`:
///
/// `d' = b + (d - b)(1 + k1 r² + k2 r⁴ + k3 r⁶)`, with `r² = |d - b|²`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionDistortion {
    pub b1: Real,
    pub b2: Real,
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
}

impl DirectionDistortion {
    /// Number of coefficients.
    pub const DIM: usize = 5;

    pub fn zeros() -> Self {
        Self::default()
    }

    /// Coefficients as `[b1, b2, k1, k2, k3]`.
    pub fn to_array(&self) -> [Real; 5] {
        [self.b1, self.b2, self.k1, self.k2, self.k3]
    }

    pub fn from_array(c: [Real; 5]) -> Self {
        Self {
            b1: c[0],
            b2: c[1],
            k1: c[2],
            k2: c[3],
            k3: c[4],
        }
    }

    pub fn apply(&self, dir: &Vec2) -> Vec2 {
        let b = Vec2::new(self.b1, self.b2);
        let d = dir - b;
        let r2 = d.norm_squared();
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        b + d * (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_coefficients_are_identity() {
        let dir = Vec2::new(0.12, -0.03);
        assert_eq!(DirectionDistortion::zeros().apply(&dir), dir);
    }

    #[test]
    fn radial_scaling_about_centre() {
        let dist = DirectionDistortion::from_array([0.01, 0.0, 0.5, 0.0, 0.0]);
        let out = dist.apply(&Vec2::new(0.11, 0.0));
        // r = 0.1 => scale = 1 + 0.5 * 0.01
        assert!((out.x - (0.01 + 0.1 * 1.005)).abs() < 1e-15, "out={out}");
        assert_eq!(out.y, 0.0);
        assert_eq!(dist.to_array(), [0.01, 0.0, 0.5, 0.0, 0.0]);
    }
}
