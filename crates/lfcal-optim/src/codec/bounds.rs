use super::{ParamBundle, ParamLayout};
use crate::error::CodecError;
use lfcal_core::Real;
use nalgebra::{DMatrix, DVector};

/// Per-parameter box constraints aligned with a flat parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: DVector<Real>,
    pub upper: DVector<Real>,
}

impl Bounds {
    /// `(-inf, +inf)` for each of `n` parameters.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: DVector::from_element(n, Real::NEG_INFINITY),
            upper: DVector::from_element(n, Real::INFINITY),
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Whether every parameter is unconstrained.
    pub fn is_unbounded(&self) -> bool {
        self.lower.iter().all(|l| *l == Real::NEG_INFINITY)
            && self.upper.iter().all(|u| *u == Real::INFINITY)
    }

    /// 2×P matrix, lower bounds in row 0, upper bounds in row 1.
    pub fn to_matrix(&self) -> DMatrix<Real> {
        let mut m = DMatrix::zeros(2, self.len());
        m.set_row(0, &self.lower.transpose());
        m.set_row(1, &self.upper.transpose());
        m
    }

    /// Flat `[low_0, high_0, low_1, high_1, ...]`, length 2×P.
    pub fn to_flat(&self) -> DVector<Real> {
        let m = self.to_matrix();
        DVector::from_column_slice(m.as_slice())
    }

    /// Check lengths and `lower <= upper` (NaN bounds are rejected).
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.upper.len() != self.lower.len() {
            return Err(CodecError::ShapeMismatch {
                expected: self.lower.len(),
                actual: self.upper.len(),
            });
        }
        for (index, (&lower, &upper)) in self.lower.iter().zip(self.upper.iter()).enumerate() {
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(CodecError::InvalidBounds {
                    index,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }

    /// Clamp `x` into the box.
    pub fn project(&self, x: &DVector<Real>) -> DVector<Real> {
        DVector::from_iterator(
            x.len(),
            x.iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .map(|(&v, (&lo, &hi))| v.max(lo).min(hi)),
        )
    }
}

/// Expand a bundle of `(low, high)` pairs into [`Bounds`] aligned with `layout`.
pub fn flatten_bounds(
    bundle: &ParamBundle<(Real, Real)>,
    layout: &ParamLayout,
) -> Result<Bounds, CodecError> {
    let pairs = layout.flatten(bundle)?;
    Ok(Bounds {
        lower: pairs.map(|(lo, _)| lo),
        upper: pairs.map(|(_, hi)| hi),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::flatten;

    #[test]
    fn bounds_follow_the_value_layout() {
        let values = ParamBundle::new()
            .with("A", DMatrix::from_element(2, 3, 0.0))
            .with("B", DMatrix::from_element(5, 1, 0.0));
        let (x, layout) = flatten(&values);
        assert_eq!(x.len(), 11);

        let unbounded = (Real::NEG_INFINITY, Real::INFINITY);
        let pairs = ParamBundle::new()
            .with("A", DMatrix::from_element(2, 3, unbounded))
            .with("B", DMatrix::from_element(5, 1, (-1.0, 1.0)));
        let bounds = flatten_bounds(&pairs, &layout).unwrap();

        let flat = bounds.to_flat();
        assert_eq!(flat.len(), 22);
        assert_eq!(flat[0], Real::NEG_INFINITY);
        assert_eq!(flat[1], Real::INFINITY);
        assert_eq!(flat[12], -1.0);
        assert_eq!(flat[13], 1.0);
        assert_eq!(bounds.to_matrix().shape(), (2, 11));
        assert!(!bounds.is_unbounded());
        assert!(bounds.validate().is_ok());
    }

    #[test]
    fn projection_and_validation() {
        let bounds = Bounds {
            lower: DVector::from_vec(vec![0.0, Real::NEG_INFINITY]),
            upper: DVector::from_vec(vec![1.0, 2.0]),
        };
        let x = DVector::from_vec(vec![-0.5, 3.0]);
        assert_eq!(bounds.project(&x).as_slice(), &[0.0, 2.0]);

        let inverted = Bounds {
            lower: DVector::from_vec(vec![1.0]),
            upper: DVector::from_vec(vec![0.0]),
        };
        assert!(matches!(
            inverted.validate(),
            Err(CodecError::InvalidBounds { index: 0, .. })
        ));
        assert!(Bounds::unbounded(3).is_unbounded());
    }
}
