use crate::{Columns4, Points3, Pt3, Real};
use serde::{Deserialize, Serialize};

/// Known 3D corner positions in the target frame, one column per corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTarget {
    pub points: Points3,
}

impl CalibrationTarget {
    pub fn new(points: Points3) -> Self {
        Self { points }
    }

    pub fn from_points(points: &[Pt3]) -> Self {
        Self::new(Points3::from_iterator(
            points.len(),
            points.iter().flat_map(|p| [p.x, p.y, p.z]),
        ))
    }

    /// Planar checkerboard corners on `z = 0`.
    ///
    /// `cols × rows` corners spaced by `spacing`, starting at the origin, in
    /// row-major order (`x` varies fastest).
    pub fn checkerboard(cols: usize, rows: usize, spacing: Real) -> Self {
        let mut points = Points3::zeros(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                points[(0, idx)] = c as Real * spacing;
                points[(1, idx)] = r as Real * spacing;
            }
        }
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mean of all corners.
    pub fn centroid(&self) -> Pt3 {
        if self.is_empty() {
            return Pt3::origin();
        }
        Pt3::from(self.points.column_mean())
    }

    /// Homogeneous 4×M view `[x, y, z, 1]`.
    pub fn homogeneous(&self) -> Columns4 {
        self.points.clone().insert_row(3, 1.0)
    }
}
