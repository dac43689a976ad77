//! Jacobian sparsity structure and column grouping.

use nalgebra::DMatrix;

/// Structural non-zeros of a Jacobian in compressed row form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    ncols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
}

impl SparsityPattern {
    pub fn new(ncols: usize) -> Self {
        Self {
            ncols,
            row_offsets: vec![0],
            col_indices: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of structural non-zeros.
    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// Append `count` rows that all depend on `cols` (sorted, unique, `< ncols`).
    pub fn push_rows(&mut self, count: usize, cols: &[usize]) {
        debug_assert!(cols.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(cols.iter().all(|&c| c < self.ncols));
        for _ in 0..count {
            self.col_indices.extend_from_slice(cols);
            self.row_offsets.push(self.col_indices.len());
        }
    }

    /// Columns of row `r`.
    pub fn row(&self, r: usize) -> &[usize] {
        &self.col_indices[self.row_offsets[r]..self.row_offsets[r + 1]]
    }

    pub fn contains(&self, r: usize, c: usize) -> bool {
        self.row(r).binary_search(&c).is_ok()
    }

    /// Rows touching each column.
    pub fn column_rows(&self) -> Vec<Vec<usize>> {
        let mut cols = vec![Vec::new(); self.ncols];
        for r in 0..self.nrows() {
            for &c in self.row(r) {
                cols[c].push(r);
            }
        }
        cols
    }

    /// Dense boolean view, mostly useful for inspection and tests.
    pub fn to_dense(&self) -> DMatrix<bool> {
        DMatrix::from_fn(self.nrows(), self.ncols, |r, c| self.contains(r, c))
    }

    /// Partition the columns into groups of structurally orthogonal columns.
    ///
    /// Columns in one group never share a row, so a single perturbation of
    /// all of them recovers each column's derivative separately. Greedy
    /// first-fit over the columns in index order; columns without any row
    /// are left out.
    pub fn column_groups(&self) -> Vec<Vec<usize>> {
        let nrows = self.nrows();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut used: Vec<Vec<bool>> = Vec::new();

        for (c, rows) in self.column_rows().iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            let slot = used
                .iter()
                .position(|mask| rows.iter().all(|&r| !mask[r]));
            let g = match slot {
                Some(g) => g,
                None => {
                    groups.push(Vec::new());
                    used.push(vec![false; nrows]);
                    groups.len() - 1
                }
            };
            groups[g].push(c);
            for &r in rows {
                used[g][r] = true;
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two shared columns followed by three per-block columns for each of
    /// three blocks with two rows each.
    fn block_pattern() -> SparsityPattern {
        let mut p = SparsityPattern::new(11);
        for b in 0..3 {
            let cols: Vec<usize> = [0, 1].into_iter().chain(2 + 3 * b..5 + 3 * b).collect();
            p.push_rows(2, &cols);
        }
        p
    }

    #[test]
    fn rows_and_dense_view() {
        let p = block_pattern();
        assert_eq!(p.nrows(), 6);
        assert_eq!(p.nnz(), 6 * 5);
        assert_eq!(p.row(3), &[0, 1, 5, 6, 7]);
        assert!(p.contains(5, 10));
        assert!(!p.contains(0, 5));
        let dense = p.to_dense();
        assert!(dense[(2, 5)] && !dense[(2, 8)]);
    }

    #[test]
    fn block_columns_share_groups() {
        let p = block_pattern();
        let groups = p.column_groups();
        // Shared columns need their own groups; block columns pack 3 per group.
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[0], vec![0]);
        assert_eq!(groups[1], vec![1]);
        assert_eq!(groups[2], vec![2, 5, 8]);
        assert_eq!(groups[4], vec![4, 7, 10]);

        let mut all: Vec<usize> = groups.concat();
        all.sort_unstable();
        assert_eq!(all, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn untouched_columns_are_skipped() {
        let mut p = SparsityPattern::new(3);
        p.push_rows(1, &[0, 2]);
        assert_eq!(p.column_groups(), vec![vec![0], vec![2]]);
    }
}
