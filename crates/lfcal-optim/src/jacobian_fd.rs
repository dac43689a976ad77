//! Forward-difference Jacobians exploiting a known sparsity pattern.

use crate::codec::Bounds;
use crate::sparsity::SparsityPattern;
use lfcal_core::Real;
use nalgebra::{DMatrix, DVector};

/// Grouped forward-difference Jacobian evaluator.
///
/// One residual evaluation per column group; see
/// [`SparsityPattern::column_groups`].
#[derive(Debug, Clone)]
pub struct GroupedJacobian {
    groups: Vec<Vec<usize>>,
    column_rows: Vec<Vec<usize>>,
    nrows: usize,
    steps: DVector<Real>,
}

impl GroupedJacobian {
    /// Build from a pattern and the typical parameter magnitudes `x_typical`.
    ///
    /// The step of parameter `j` is `sqrt(eps) * |x_typical[j]|`, or
    /// `sqrt(eps)` when that entry is zero.
    pub fn new(pattern: &SparsityPattern, x_typical: &DVector<Real>) -> Self {
        debug_assert_eq!(pattern.ncols(), x_typical.len());
        let sqrt_eps = Real::EPSILON.sqrt();
        let steps = x_typical.map(|v| if v != 0.0 { sqrt_eps * v.abs() } else { sqrt_eps });
        Self {
            groups: pattern.column_groups(),
            column_rows: pattern.column_rows(),
            nrows: pattern.nrows(),
            steps,
        }
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn steps(&self) -> &DVector<Real> {
        &self.steps
    }

    /// Jacobian of `f` at `x`, given `r0 = f(x)`.
    ///
    /// A step that would cross the upper bound is taken backwards instead,
    /// and every probe is clamped into `bounds`. Columns whose parameter is
    /// pinned by a degenerate box stay zero. Returns `None` if any evaluation
    /// of `f` fails.
    pub fn evaluate<F>(
        &self,
        f: F,
        x: &DVector<Real>,
        r0: &DVector<Real>,
        bounds: Option<&Bounds>,
    ) -> Option<DMatrix<Real>>
    where
        F: Fn(&DVector<Real>) -> Option<DVector<Real>>,
    {
        debug_assert_eq!(r0.len(), self.nrows);
        let mut jac = DMatrix::zeros(self.nrows, x.len());
        for group in &self.groups {
            let mut xp = x.clone();
            for &c in group {
                let mut h = self.steps[c];
                if let Some(b) = bounds {
                    if x[c] + h > b.upper[c] {
                        h = -h;
                    }
                    xp[c] = (x[c] + h).clamp(b.lower[c], b.upper[c]);
                } else {
                    xp[c] += h;
                }
            }
            let rp = f(&xp)?;
            if rp.len() != self.nrows {
                return None;
            }
            for &c in group {
                let h = xp[c] - x[c];
                if h == 0.0 {
                    continue;
                }
                for &r in &self.column_rows[c] {
                    jac[(r, c)] = (rp[r] - r0[r]) / h;
                }
            }
        }
        Some(jac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// r_b = [x0 + 2 * x_{1+b}, x0 * x_{1+b}] for blocks b = 0..3.
    fn residuals(x: &DVector<Real>) -> Option<DVector<Real>> {
        let mut r = DVector::zeros(6);
        for b in 0..3 {
            r[2 * b] = x[0] + 2.0 * x[1 + b];
            r[2 * b + 1] = x[0] * x[1 + b];
        }
        Some(r)
    }

    fn pattern() -> SparsityPattern {
        let mut p = SparsityPattern::new(4);
        for b in 0..3 {
            p.push_rows(2, &[0, 1 + b]);
        }
        p
    }

    #[test]
    fn grouped_fd_matches_analytic_jacobian() {
        let x = DVector::from_vec(vec![1.5, -2.0, 0.0, 3.0]);
        let fd = GroupedJacobian::new(&pattern(), &x);
        assert_eq!(fd.num_groups(), 2);

        let r0 = residuals(&x).unwrap();
        let jac = fd.evaluate(residuals, &x, &r0, None).unwrap();
        for b in 0..3 {
            assert!((jac[(2 * b, 0)] - 1.0).abs() < 1e-6);
            assert!((jac[(2 * b, 1 + b)] - 2.0).abs() < 1e-6);
            assert!((jac[(2 * b + 1, 0)] - x[1 + b]).abs() < 1e-6);
            assert!((jac[(2 * b + 1, 1 + b)] - x[0]).abs() < 1e-6);
            for other in (0..3).filter(|&o| o != b) {
                assert_eq!(jac[(2 * b, 1 + other)], 0.0);
            }
        }
    }

    #[test]
    fn steps_scale_with_typical_values() {
        let x = DVector::from_vec(vec![0.0, 100.0, -1e-3, 1.0]);
        let fd = GroupedJacobian::new(&pattern(), &x);
        let s = Real::EPSILON.sqrt();
        assert_eq!(fd.steps()[0], s);
        assert!((fd.steps()[1] - 100.0 * s).abs() < 1e-20);
        assert!((fd.steps()[2] - 1e-3 * s).abs() < 1e-24);
    }

    #[test]
    fn steps_flip_at_upper_bound() {
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0, 1.0]);
        let mut bounds = Bounds::unbounded(4);
        bounds.upper[1] = 1.0;
        let fd = GroupedJacobian::new(&pattern(), &x);
        let r0 = residuals(&x).unwrap();
        let jac = fd.evaluate(residuals, &x, &r0, Some(&bounds)).unwrap();
        assert!((jac[(0, 1)] - 2.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn probes_stay_inside_narrow_box() {
        let x = DVector::from_vec(vec![1.0, 1.0, 2.0, 3.0]);
        let mut bounds = Bounds::unbounded(4);
        let s = Real::EPSILON.sqrt();
        // narrower than the step on both sides
        bounds.lower[1] = 1.0 - 0.25 * s;
        bounds.upper[1] = 1.0 + 0.25 * s;
        // pinned
        bounds.lower[2] = 2.0;
        bounds.upper[2] = 2.0;

        let fd = GroupedJacobian::new(&pattern(), &x);
        let r0 = residuals(&x).unwrap();
        let f = |xp: &DVector<Real>| {
            assert!(xp[1] >= bounds.lower[1] && xp[1] <= bounds.upper[1], "x1={}", xp[1]);
            assert_eq!(xp[2], 2.0);
            residuals(xp)
        };
        let jac = fd.evaluate(f, &x, &r0, Some(&bounds)).unwrap();

        assert!((jac[(0, 1)] - 2.0).abs() < 1e-3);
        assert!((jac[(1, 1)] - 1.0).abs() < 1e-3);
        assert_eq!(jac[(2, 2)], 0.0);
        assert_eq!(jac[(3, 2)], 0.0);
        assert!((jac[(4, 3)] - 2.0).abs() < 1e-6);
    }
}
