// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Describes the dimensionality of a [`crate::Tensor`] or weight constant.
///
/// Feature maps are rank 3 in `[height, width, channels]` order; conv
/// filters are rank 4 in `[kernel_height, kernel_width, input_channels,
/// output_channels]` order (the channel-multiplier sits in the last slot
/// for depthwise filters). Shapes are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![28, 28, 3]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 2352);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a rank-3 feature-map shape `[height, width, channels]`.
    pub fn hwc(height: usize, width: usize, channels: usize) -> Self {
        Self {
            dims: vec![height, width, channels],
        }
    }

    /// Creates a rank-4 filter shape
    /// `[kernel_height, kernel_width, input_channels, output_channels]`.
    pub fn filter(
        kernel_height: usize,
        kernel_width: usize,
        input_channels: usize,
        output_channels: usize,
    ) -> Self {
        Self {
            dims: vec![kernel_height, kernel_width, input_channels, output_channels],
        }
    }

    /// Creates a 1-D shape (used for bias and activation-slope tables).
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a rank-0 shape, returns 1. Returns `None` if the product
    /// overflows `usize` — callers treat that as an invalid shape.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns the total number of elements.
    ///
    /// # Panics
    /// Panics if the element count overflows `usize`; use
    /// [`checked_num_elements`](Self::checked_num_elements) when the shape
    /// comes from untrusted input.
    pub fn num_elements(&self) -> usize {
        self.checked_num_elements()
            .expect("shape volume overflows usize")
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Height of a rank-3 feature map (dimension 0).
    ///
    /// # Panics
    /// Panics if the shape has rank < 3.
    pub fn height(&self) -> usize {
        self.dims[0]
    }

    /// Width of a rank-3 feature map (dimension 1).
    ///
    /// # Panics
    /// Panics if the shape has rank < 3.
    pub fn width(&self) -> usize {
        self.dims[1]
    }

    /// Channel count of a rank-3 feature map (dimension 2).
    ///
    /// # Panics
    /// Panics if the shape has rank < 3.
    pub fn channels(&self) -> usize {
        self.dims[2]
    }

    /// Returns `true` if this is a rank-3 shape with positive spatial
    /// dimensions — the precondition every layer checks before shape
    /// inference.
    pub fn is_valid_feature(&self) -> bool {
        self.rank() == 3 && self.dims[0] > 0 && self.dims[1] > 0 && self.dims[2] > 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![28, 28, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[28, 28, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hwc_shape() {
        let s = Shape::hwc(28, 28, 3);
        assert_eq!(s.rank(), 3);
        assert_eq!(s.height(), 28);
        assert_eq!(s.width(), 28);
        assert_eq!(s.channels(), 3);
        assert_eq!(s.num_elements(), 28 * 28 * 3);
        assert!(s.is_valid_feature());
    }

    #[test]
    fn test_filter_shape() {
        let s = Shape::filter(3, 3, 8, 16);
        assert_eq!(s.rank(), 4);
        assert_eq!(s.num_elements(), 3 * 3 * 8 * 16);
        assert!(!s.is_valid_feature());
    }

    #[test]
    fn test_vector_shape() {
        let s = Shape::vector(10);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.num_elements(), 10);
    }

    #[test]
    fn test_zero_spatial_is_invalid() {
        assert!(!Shape::hwc(0, 28, 1).is_valid_feature());
        assert!(!Shape::hwc(28, 0, 1).is_valid_feature());
        assert!(!Shape::hwc(28, 28, 0).is_valid_feature());
    }

    #[test]
    fn test_checked_num_elements_overflow() {
        let s = Shape::new(vec![usize::MAX, 2]);
        assert_eq!(s.checked_num_elements(), None);
    }

    #[test]
    fn test_display() {
        let s = Shape::hwc(14, 14, 8);
        assert_eq!(format!("{s}"), "[14, 14, 8]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = Shape::hwc(7, 7, 16);
        let json = serde_json::to_string(&s).unwrap();
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
