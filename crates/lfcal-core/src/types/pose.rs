use crate::{isometry_from_pose_vector, pose_vector_from_isometry, Iso3, Real, Vec6};
use anyhow::{ensure, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Per-image poses `[rx, ry, rz, tx, ty, tz]` (rotation vector + translation)
/// mapping target coordinates into the camera frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSet {
    poses: Vec<Vec6>,
}

impl PoseSet {
    pub fn new(poses: Vec<Vec6>) -> Self {
        Self { poses }
    }

    pub fn from_isometries(isos: &[Iso3]) -> Self {
        Self::new(isos.iter().map(pose_vector_from_isometry).collect())
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Vec6> {
        self.poses.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec6> {
        self.poses.iter()
    }

    pub fn as_slice(&self) -> &[Vec6] {
        &self.poses
    }

    /// Rigid transform of pose `idx`.
    pub fn isometry(&self, idx: usize) -> Option<Iso3> {
        self.poses.get(idx).map(isometry_from_pose_vector)
    }

    /// N×6 matrix, one pose per row.
    pub fn to_matrix(&self) -> DMatrix<Real> {
        DMatrix::from_fn(self.poses.len(), 6, |r, c| self.poses[r][c])
    }

    pub fn from_matrix(m: &DMatrix<Real>) -> Result<Self> {
        ensure!(m.ncols() == 6, "pose matrix must have 6 columns, got {}", m.ncols());
        Ok(Self::new(
            m.row_iter().map(|row| Vec6::from_iterator(row.iter().copied())).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_roundtrip() {
        let poses = PoseSet::new(vec![
            Vec6::new(0.1, 0.2, 0.3, 1.0, 2.0, 3.0),
            Vec6::new(-0.1, 0.0, 0.05, 0.0, 0.0, 0.5),
        ]);
        let m = poses.to_matrix();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m[(1, 5)], 0.5);
        assert_eq!(PoseSet::from_matrix(&m).unwrap(), poses);
        assert!(PoseSet::from_matrix(&DMatrix::zeros(2, 5)).is_err());
    }

    #[test]
    fn isometry_roundtrip() {
        let poses = PoseSet::new(vec![Vec6::new(0.2, -0.1, 0.3, 0.01, 0.02, 0.4)]);
        let iso = poses.isometry(0).unwrap();
        let back = PoseSet::from_isometries(&[iso]);
        assert!((back.as_slice()[0] - poses.as_slice()[0]).norm() < 1e-12);
        assert!(poses.isometry(1).is_none());
    }
}
