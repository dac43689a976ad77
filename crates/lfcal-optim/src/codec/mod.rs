//! Flat vector encoding of named parameter blocks.
//!
//! A [`ParamBundle`] is an ordered list of named matrices. [`flatten`]
//! concatenates their elements (column-major within each block, blocks in
//! bundle order) and returns the [`ParamLayout`] needed to invert it. The same
//! machinery serves parameter values (`f64`), per-parameter sensitivity tags
//! and `(low, high)` bound pairs, since blocks are generic over the scalar.

mod bounds;

pub use bounds::{flatten_bounds, Bounds};

use crate::error::CodecError;
use nalgebra::{DMatrix, DVector, Scalar};
use std::ops::Range;

/// One named block of a [`ParamBundle`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBlock<T: Scalar> {
    pub name: String,
    pub value: DMatrix<T>,
}

/// Ordered collection of named parameter blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBundle<T: Scalar> {
    blocks: Vec<ParamBlock<T>>,
}

impl<T: Scalar> Default for ParamBundle<T> {
    fn default() -> Self {
        Self { blocks: Vec::new() }
    }
}

impl<T: Scalar> ParamBundle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block; names are expected to be unique.
    pub fn push(&mut self, name: impl Into<String>, value: DMatrix<T>) {
        self.blocks.push(ParamBlock {
            name: name.into(),
            value,
        });
    }

    /// Builder form of [`ParamBundle::push`].
    pub fn with(mut self, name: impl Into<String>, value: DMatrix<T>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DMatrix<T>> {
        self.blocks.iter().find(|b| b.name == name).map(|b| &b.value)
    }

    /// Like [`ParamBundle::get`] but reports a [`CodecError::MissingBlock`].
    pub fn require(&self, name: &str) -> Result<&DMatrix<T>, CodecError> {
        self.get(name)
            .ok_or_else(|| CodecError::MissingBlock(name.to_string()))
    }

    pub fn blocks(&self) -> &[ParamBlock<T>] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Position and shape of one block inside the flat vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub name: String,
    pub nrows: usize,
    pub ncols: usize,
    pub offset: usize,
}

impl BlockLayout {
    pub fn len(&self) -> usize {
        self.nrows * self.ncols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len()
    }
}

/// Layout of a flattened [`ParamBundle`]: block names, shapes and offsets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamLayout {
    blocks: Vec<BlockLayout>,
    total: usize,
}

impl ParamLayout {
    /// Layout describing `bundle`.
    pub fn of<T: Scalar>(bundle: &ParamBundle<T>) -> Self {
        let mut offset = 0;
        let blocks = bundle
            .blocks
            .iter()
            .map(|b| {
                let layout = BlockLayout {
                    name: b.name.clone(),
                    nrows: b.value.nrows(),
                    ncols: b.value.ncols(),
                    offset,
                };
                offset += layout.len();
                layout
            })
            .collect();
        Self {
            blocks,
            total: offset,
        }
    }

    /// Total number of scalars.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn blocks(&self) -> &[BlockLayout] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&BlockLayout> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Flatten `bundle`, which must have exactly this layout's blocks.
    pub fn flatten<T: Scalar>(&self, bundle: &ParamBundle<T>) -> Result<DVector<T>, CodecError> {
        if bundle.len() != self.blocks.len() {
            return Err(CodecError::BlockMismatch {
                index: bundle.len().min(self.blocks.len()),
                expected: format!("{} blocks", self.blocks.len()),
                found: format!("{} blocks", bundle.len()),
            });
        }
        for (index, (block, layout)) in bundle.blocks.iter().zip(&self.blocks).enumerate() {
            if block.name != layout.name
                || block.value.nrows() != layout.nrows
                || block.value.ncols() != layout.ncols
            {
                return Err(CodecError::BlockMismatch {
                    index,
                    expected: format!("{} {}x{}", layout.name, layout.nrows, layout.ncols),
                    found: format!(
                        "{} {}x{}",
                        block.name,
                        block.value.nrows(),
                        block.value.ncols()
                    ),
                });
            }
        }
        Ok(concat(bundle, self.total))
    }

    /// Rebuild the bundle from a flat vector of length [`ParamLayout::len`].
    pub fn unflatten<T: Scalar>(&self, x: &DVector<T>) -> Result<ParamBundle<T>, CodecError> {
        if x.len() != self.total {
            return Err(CodecError::ShapeMismatch {
                expected: self.total,
                actual: x.len(),
            });
        }
        let data = x.as_slice();
        let blocks = self
            .blocks
            .iter()
            .map(|b| ParamBlock {
                name: b.name.clone(),
                value: DMatrix::from_column_slice(b.nrows, b.ncols, &data[b.range()]),
            })
            .collect();
        Ok(ParamBundle { blocks })
    }
}

fn concat<T: Scalar>(bundle: &ParamBundle<T>, total: usize) -> DVector<T> {
    DVector::from_iterator(
        total,
        bundle.blocks.iter().flat_map(|b| b.value.iter().cloned()),
    )
}

/// Concatenate all blocks into a flat vector and describe the layout.
pub fn flatten<T: Scalar>(bundle: &ParamBundle<T>) -> (DVector<T>, ParamLayout) {
    let layout = ParamLayout::of(bundle);
    let x = concat(bundle, layout.len());
    (x, layout)
}

/// Inverse of [`flatten`].
pub fn unflatten<T: Scalar>(
    x: &DVector<T>,
    layout: &ParamLayout,
) -> Result<ParamBundle<T>, CodecError> {
    layout.unflatten(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle() -> ParamBundle<f64> {
        ParamBundle::new()
            .with("A", DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
            .with("B", DMatrix::from_column_slice(5, 1, &[7.0, 8.0, 9.0, 10.0, 11.0]))
    }

    #[test]
    fn flatten_is_column_major_in_block_order() {
        let (x, layout) = flatten(&sample_bundle());
        assert_eq!(x.len(), 11);
        assert_eq!(
            x.as_slice(),
            &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]
        );
        assert_eq!(layout.block("B").unwrap().range(), 6..11);
    }

    #[test]
    fn unflatten_restores_values_and_shapes() {
        let bundle = sample_bundle();
        let (x, layout) = flatten(&bundle);
        let back = unflatten(&x, &layout).unwrap();
        assert_eq!(back, bundle);
        assert_eq!(back.require("A").unwrap().shape(), (2, 3));
        assert_eq!(
            back.require("C").unwrap_err(),
            CodecError::MissingBlock("C".into())
        );
    }

    #[test]
    fn empty_blocks_take_no_space() {
        let bundle = ParamBundle::new()
            .with("A", DMatrix::from_element(1, 2, 1.0))
            .with("empty", DMatrix::<f64>::zeros(0, 1))
            .with("C", DMatrix::from_element(1, 1, 2.0));
        let (x, layout) = flatten(&bundle);
        assert_eq!(x.as_slice(), &[1.0, 1.0, 2.0]);
        assert_eq!(layout.block("empty").unwrap().range(), 2..2);
        assert_eq!(unflatten(&x, &layout).unwrap(), bundle);
    }

    #[test]
    fn wrong_lengths_and_blocks_are_rejected() {
        let (x, layout) = flatten(&sample_bundle());
        let short = x.rows(0, 10).into_owned();
        assert_eq!(
            unflatten(&short, &layout).unwrap_err(),
            CodecError::ShapeMismatch {
                expected: 11,
                actual: 10
            }
        );

        let renamed = ParamBundle::new()
            .with("A", DMatrix::from_element(2, 3, 0.0))
            .with("Z", DMatrix::from_element(5, 1, 0.0));
        assert!(matches!(
            layout.flatten(&renamed),
            Err(CodecError::BlockMismatch { index: 1, .. })
        ));
        assert_eq!(layout.flatten(&sample_bundle()).unwrap(), x);
    }

    #[test]
    fn non_numeric_scalars_share_the_layout() {
        let (_, layout) = flatten(&sample_bundle());
        let tags = ParamBundle::new()
            .with("A", DMatrix::from_element(2, 3, 'a'))
            .with("B", DMatrix::from_element(5, 1, 'b'));
        let flat = layout.flatten(&tags).unwrap();
        assert_eq!(flat.iter().filter(|&&c| c == 'a').count(), 6);
        assert_eq!(flat[6], 'b');
    }
}
