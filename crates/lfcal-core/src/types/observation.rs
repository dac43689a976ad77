//! Checkerboard corner observations of a light field.
//!
//! Every calibration image is decoded into a grid of sub-aperture images
//! indexed by `(i, j)`. Corner detection runs per sub-aperture image and
//! yields the `(k, l)` pixel coordinates of the target corners, in target
//! point order. The detections of one `(pose, j, i)` triple form a *cell*; an
//! empty cell means the target was not detected there.

use crate::{Pt2, Real, Samples5};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Corner detections for `num_poses` images over a `rows × cols` grid of
/// sub-aperture images (`rows` along `j`, `cols` along `i`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CheckerObservationsRaw")]
pub struct CheckerObservations {
    num_poses: usize,
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Pt2>>,
}

#[derive(Deserialize)]
struct CheckerObservationsRaw {
    num_poses: usize,
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Pt2>>,
}

impl TryFrom<CheckerObservationsRaw> for CheckerObservations {
    type Error = String;

    fn try_from(raw: CheckerObservationsRaw) -> std::result::Result<Self, Self::Error> {
        let expected = raw.num_poses * raw.rows * raw.cols;
        if raw.cells.len() != expected {
            return Err(format!(
                "observation cell count {} does not match {} poses x {} rows x {} cols",
                raw.cells.len(),
                raw.num_poses,
                raw.rows,
                raw.cols
            ));
        }
        Ok(Self {
            num_poses: raw.num_poses,
            rows: raw.rows,
            cols: raw.cols,
            cells: raw.cells,
        })
    }
}

impl CheckerObservations {
    /// Create a grid with every cell empty.
    pub fn new(num_poses: usize, rows: usize, cols: usize) -> Self {
        Self {
            num_poses,
            rows,
            cols,
            cells: vec![Vec::new(); num_poses * rows * cols],
        }
    }

    pub fn num_poses(&self) -> usize {
        self.num_poses
    }

    /// Number of sub-aperture rows (`j` extent).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of sub-aperture columns (`i` extent).
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, pose: usize, j: usize, i: usize) -> usize {
        (pose * self.rows + j) * self.cols + i
    }

    fn check_cell(&self, pose: usize, j: usize, i: usize) -> Result<()> {
        ensure!(
            pose < self.num_poses && j < self.rows && i < self.cols,
            "cell (pose={pose}, j={j}, i={i}) outside {}x{}x{} grid",
            self.num_poses,
            self.rows,
            self.cols
        );
        Ok(())
    }

    /// Corners of one cell; fails if the indices are outside the grid.
    pub fn cell(&self, pose: usize, j: usize, i: usize) -> Result<&[Pt2]> {
        self.check_cell(pose, j, i)?;
        Ok(&self.cells[self.index(pose, j, i)])
    }

    /// Number of corners detected in one cell.
    pub fn count(&self, pose: usize, j: usize, i: usize) -> Result<usize> {
        Ok(self.cell(pose, j, i)?.len())
    }

    /// Replace the corners of one cell.
    pub fn set_cell(&mut self, pose: usize, j: usize, i: usize, corners: Vec<Pt2>) -> Result<()> {
        self.check_cell(pose, j, i)?;
        let idx = self.index(pose, j, i);
        self.cells[idx] = corners;
        Ok(())
    }

    /// Mutable access to the corners of one cell.
    pub fn cell_mut(&mut self, pose: usize, j: usize, i: usize) -> Result<&mut Vec<Pt2>> {
        self.check_cell(pose, j, i)?;
        let idx = self.index(pose, j, i);
        Ok(&mut self.cells[idx])
    }

    /// Iterate all cells mutably as `(pose, j, i, corners)`.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = (usize, usize, usize, &mut Vec<Pt2>)> + '_ {
        let (rows, cols) = (self.rows, self.cols);
        self.cells.iter_mut().enumerate().map(move |(idx, cell)| {
            let i = idx % cols;
            let j = (idx / cols) % rows;
            (idx / (cols * rows), j, i, cell)
        })
    }

    /// Homogeneous 5×K sample matrix of a cell, columns `[i, j, k, l, 1]`.
    pub fn homogeneous_cell(&self, pose: usize, j: usize, i: usize) -> Result<Samples5> {
        let corners = self.cell(pose, j, i)?;
        let mut m = Samples5::zeros(corners.len());
        for (c, p) in corners.iter().enumerate() {
            m[(0, c)] = i as Real;
            m[(1, c)] = j as Real;
            m[(2, c)] = p.x;
            m[(3, c)] = p.y;
            m[(4, c)] = 1.0;
        }
        Ok(m)
    }

    /// Total number of corners over all cells.
    pub fn total_corners(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_independent() {
        let mut obs = CheckerObservations::new(2, 3, 4);
        obs.set_cell(1, 2, 3, vec![Pt2::new(1.0, 2.0)]).unwrap();
        obs.cell_mut(0, 1, 2).unwrap().push(Pt2::new(5.0, 6.0));

        assert_eq!(obs.count(1, 2, 3).unwrap(), 1);
        assert_eq!(obs.count(0, 1, 2).unwrap(), 1);
        assert_eq!(obs.count(0, 2, 3).unwrap(), 0);
        assert_eq!(obs.total_corners(), 2);
        assert!(obs.set_cell(2, 0, 0, Vec::new()).is_err());
    }

    #[test]
    fn out_of_grid_reads_are_errors() {
        let obs = CheckerObservations::new(1, 4, 4);
        assert!(obs.cell(0, 4, 0).is_err());
        assert!(obs.count(0, 0, 5).is_err());
        assert!(obs.count(1, 0, 0).is_err());
        let err = obs.homogeneous_cell(0, 5, 5).unwrap_err();
        assert!(err.to_string().contains("outside 1x4x4 grid"));
    }

    #[test]
    fn homogeneous_cell_layout() {
        let mut obs = CheckerObservations::new(1, 3, 4);
        obs.set_cell(0, 2, 1, vec![Pt2::new(10.5, 20.25), Pt2::new(11.0, 21.0)])
            .unwrap();
        let m = obs.homogeneous_cell(0, 2, 1).unwrap();
        assert_eq!(m.ncols(), 2);
        assert_eq!(m.column(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 10.5, 20.25, 1.0]);
        assert_eq!(m.column(1).iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 11.0, 21.0, 1.0]);
    }

    #[test]
    fn deserialization_rejects_inconsistent_grid() {
        let json = r#"{"num_poses":1,"rows":2,"cols":2,"cells":[[],[]]}"#;
        assert!(serde_json::from_str::<CheckerObservations>(json).is_err());

        let obs = CheckerObservations::new(1, 2, 2);
        let json = serde_json::to_string(&obs).unwrap();
        let back: CheckerObservations = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }
}
