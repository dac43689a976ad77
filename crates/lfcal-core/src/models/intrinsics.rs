use crate::{Mat5, Real, Vec5};
use serde::{Deserialize, Serialize};

/// Entries `(row, col)` of the intrinsic matrix that refinement may change.
///
/// In order: `s/i`, `u/i`, `t/j`, `v/j`, `s/k`, `u/k`, `t/l`, `v/l`. All other
/// entries are held fixed; the offset column is re-derived by
/// [`recenter_intrinsics`].
pub const FREE_INTRINSIC_ENTRIES: [(usize, usize); 8] = [
    (0, 0),
    (2, 0),
    (1, 1),
    (3, 1),
    (0, 2),
    (2, 2),
    (1, 3),
    (3, 3),
];

/// Sample counts of a light field along its four indices.
///
/// `i`, `j` count the angular (sub-aperture) samples; `k`, `l` the spatial
/// samples (pixels) within one sub-aperture image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LfSize {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
}

impl Default for LfSize {
    fn default() -> Self {
        Self {
            i: 11,
            j: 11,
            k: 380,
            l: 380,
        }
    }
}

impl LfSize {
    pub fn new(i: usize, j: usize, k: usize, l: usize) -> Self {
        Self { i, j, k, l }
    }

    /// Central sample `[(n_i-1)/2, (n_j-1)/2, (n_k-1)/2, (n_l-1)/2, 1]`.
    pub fn center_sample(&self) -> Vec5 {
        let half = |n: usize| (n as Real - 1.0) / 2.0;
        Vec5::new(half(self.i), half(self.j), half(self.k), half(self.l), 1.0)
    }
}

/// Set the offset column `H[0..4, 4]` so the central sample maps to the zero ray.
///
/// Any previous offsets are discarded first, so the result depends only on the
/// remaining entries of `h` and on `size`.
pub fn recenter_intrinsics(h: &mut Mat5, size: &LfSize) {
    for r in 0..4 {
        h[(r, 4)] = 0.0;
    }
    let offset = -(*h * size.center_sample());
    for r in 0..4 {
        h[(r, 4)] = offset[r];
    }
}

/// Build a recentered intrinsic matrix from the eight free entries, given in
/// [`FREE_INTRINSIC_ENTRIES`] order. Every other entry of the upper 4×4 block
/// is zero.
pub fn intrinsics_from_free(values: &[Real; 8], size: &LfSize) -> Mat5 {
    let mut h = Mat5::identity();
    for d in 0..4 {
        h[(d, d)] = 0.0;
    }
    for (&(r, c), &v) in FREE_INTRINSIC_ENTRIES.iter().zip(values) {
        h[(r, c)] = v;
    }
    recenter_intrinsics(&mut h, size);
    h
}

/// Read the eight free entries of `h` in [`FREE_INTRINSIC_ENTRIES`] order.
pub fn free_intrinsic_values(h: &Mat5) -> [Real; 8] {
    let mut out = [0.0; 8];
    for (slot, &(r, c)) in out.iter_mut().zip(FREE_INTRINSIC_ENTRIES.iter()) {
        *slot = h[(r, c)];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_free() -> [Real; 8] {
        [4.0e-4, -1.0e-3, 4.1e-4, -1.0e-3, -2.0e-6, 2.0e-3, -2.0e-6, 2.05e-3]
    }

    #[test]
    fn recentered_matrix_maps_center_to_zero_ray() {
        let size = LfSize::new(5, 7, 120, 100);
        let h = intrinsics_from_free(&sample_free(), &size);
        let ray = h * size.center_sample();
        for r in 0..4 {
            assert!(ray[r].abs() < 1e-15, "ray={ray}");
        }
        assert_eq!(ray[4], 1.0);
    }

    #[test]
    fn recenter_ignores_previous_offsets() {
        let size = LfSize::new(5, 5, 64, 64);
        let h = intrinsics_from_free(&sample_free(), &size);
        let mut shifted = h;
        shifted[(0, 4)] += 3.0;
        shifted[(3, 4)] -= 0.5;
        recenter_intrinsics(&mut shifted, &size);
        assert_eq!(shifted, h);
    }

    #[test]
    fn free_values_roundtrip() {
        let size = LfSize::default();
        let h = intrinsics_from_free(&sample_free(), &size);
        assert_eq!(free_intrinsic_values(&h), sample_free());
        assert_eq!(h.row(4).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
