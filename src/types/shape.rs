//! Frame shape descriptor

use std::fmt;

use crate::DecodeError;

/// Ordered dimension extents of a frame, outermost first.
///
/// A shape is either a single image `(rows, cols)` or a slice stack
/// `(slices, rows, cols)` as produced by the reconstruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<u32>,
}

impl Shape {
    /// Smallest accepted rank.
    pub const MIN_RANK: usize = 2;
    /// Largest accepted rank.
    pub const MAX_RANK: usize = 3;

    /// Build a shape from raw extents, rejecting unsupported ranks.
    pub fn new(dims: impl Into<Vec<u32>>) -> Result<Self, DecodeError> {
        let dims = dims.into();
        if !(Self::MIN_RANK..=Self::MAX_RANK).contains(&dims.len()) {
            return Err(DecodeError::InvalidRank { rank: dims.len() });
        }
        Ok(Self { dims })
    }

    /// A single `rows × cols` image.
    pub fn image(rows: u32, cols: u32) -> Self {
        Self { dims: vec![rows, cols] }
    }

    /// A stack of `slices` images of `rows × cols`.
    pub fn stack(slices: u32, rows: u32, cols: u32) -> Self {
        Self { dims: vec![slices, rows, cols] }
    }

    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn rows(&self) -> u32 {
        self.dims[self.rank() - 2]
    }

    pub fn cols(&self) -> u32 {
        self.dims[self.rank() - 1]
    }

    /// Leading slice count for stacked shapes.
    pub fn slices(&self) -> Option<u32> {
        (self.rank() == Self::MAX_RANK).then(|| self.dims[0])
    }

    /// The `rows × cols` shape of one image in this shape.
    pub fn plane(&self) -> Shape {
        Shape::image(self.rows(), self.cols())
    }

    /// Total number of elements, computed without overflow.
    pub fn element_count(&self) -> u128 {
        self.dims.iter().map(|&d| u128::from(d)).product()
    }

    /// Byte length of a payload with elements of `width` bytes.
    ///
    /// Returns `None` only if the product does not fit in `u128`.
    pub fn byte_len(&self, width: usize) -> Option<u128> {
        self.dims
            .iter()
            .try_fold(width as u128, |acc, &d| acc.checked_mul(u128::from(d)))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str("x")?;
            }
            write!(f, "{dim}")?;
        }
        Ok(())
    }
}
