// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The mutable fixed-point feature map.
//!
//! A [`Tensor`] carries shape, exponent, and padding metadata from the
//! moment its owning layer is constructed, but element storage is
//! allocated lazily on first use and sized to the *padded* volume, so
//! conv kernels read margin pixels without bounds checks or copies.
//!
//! # Memory discipline
//! [`ensure_storage`](Tensor::ensure_storage) is the only place that
//! allocates, and it is gated by an "already sized correctly" check:
//! re-running a model with an unchanged input shape costs zero
//! allocations. Changing the shape invalidates storage; changing the
//! padding of an allocated tensor re-embeds the valid region into the
//! new margin (this happens at build time only, never per call).

use crate::{Element, Padding, Shape, TensorError};

/// A mutable fixed-point tensor with shape `[height, width, channels]`.
///
/// The stored integer `v` at exponent `e` represents `v * 2^e`. A layer
/// exclusively owns its output tensor; input tensors are only ever
/// borrowed.
#[derive(Debug, Clone)]
pub struct Tensor<T: Element> {
    shape: Shape,
    exponent: i32,
    padding: Padding,
    storage: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Creates an empty tensor with the given exponent and no shape.
    ///
    /// This is the state a layer's output is in between construction
    /// and the first `build`.
    pub fn new(exponent: i32) -> Self {
        Self {
            shape: Shape::new(Vec::new()),
            exponent,
            padding: Padding::ZERO,
            storage: Vec::new(),
        }
    }

    /// Creates an unallocated tensor with a known shape.
    pub fn with_shape(shape: Shape, exponent: i32) -> Self {
        Self {
            shape,
            exponent,
            padding: Padding::ZERO,
            storage: Vec::new(),
        }
    }

    /// Returns the valid-region shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the fixed-point exponent.
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Sets the fixed-point exponent.
    pub fn set_exponent(&mut self, exponent: i32) {
        self.exponent = exponent;
    }

    /// Returns the padding margin surrounding the valid region.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Replaces the shape.
    ///
    /// A changed shape invalidates element storage and resets the padding
    /// promise — the next `build` recomputes it and the next
    /// [`ensure_storage`](Self::ensure_storage) reallocates.
    pub fn set_shape(&mut self, shape: Shape) {
        if shape == self.shape {
            return;
        }
        self.shape = shape;
        self.padding = Padding::ZERO;
        self.storage = Vec::new();
    }

    /// Records the padding margin a consuming layer requires.
    ///
    /// If storage is already allocated, the valid region is re-embedded
    /// into a fresh buffer with the new margin so existing data survives
    /// (this is the one data copy in the engine, paid at build time).
    pub fn set_padding(&mut self, padding: Padding) -> Result<(), TensorError> {
        if padding == self.padding {
            return Ok(());
        }
        if self.storage.is_empty() {
            self.padding = padding;
            return Ok(());
        }

        let old_padding = std::mem::replace(&mut self.padding, padding);
        let old_width = self.shape.width() + old_padding.horizontal();
        let mut fresh = match self.alloc_padded() {
            Ok(buffer) => buffer,
            Err(e) => {
                self.padding = old_padding;
                return Err(e);
            }
        };

        let (h, w, c) = (self.shape.height(), self.shape.width(), self.shape.channels());
        let new_width = w + padding.horizontal();
        let row = w * c;
        for y in 0..h {
            let src = ((y + old_padding.top) * old_width + old_padding.left) * c;
            let dst = ((y + padding.top) * new_width + padding.left) * c;
            fresh[dst..dst + row].copy_from_slice(&self.storage[src..src + row]);
        }
        self.storage = fresh;
        Ok(())
    }

    /// Height of the padded storage plane.
    ///
    /// # Panics
    /// Panics if the tensor has no rank-3 shape yet.
    pub fn padded_height(&self) -> usize {
        self.shape.height() + self.padding.vertical()
    }

    /// Width of the padded storage plane.
    ///
    /// # Panics
    /// Panics if the tensor has no rank-3 shape yet.
    pub fn padded_width(&self) -> usize {
        self.shape.width() + self.padding.horizontal()
    }

    /// Allocates element storage if it is not already sized for the
    /// current shape and padding. Returns `true` if an allocation
    /// actually happened.
    ///
    /// Fresh storage is zero-filled, so the padding margin carries the
    /// implicit zeros the conv kernels rely on.
    pub fn ensure_storage(&mut self) -> Result<bool, TensorError> {
        let needed = self.padded_num_elements()?;
        if self.storage.len() == needed {
            return Ok(false);
        }
        self.storage = self.alloc_padded()?;
        Ok(true)
    }

    /// Returns `true` once element storage has been allocated.
    pub fn is_allocated(&self) -> bool {
        !self.storage.is_empty()
    }

    /// Storage footprint in bytes for the current shape and padding
    /// (whether or not storage is allocated yet). Returns 0 for an
    /// unshaped tensor.
    pub fn size_bytes(&self) -> usize {
        if self.shape.rank() != 3 {
            return 0;
        }
        self.padded_num_elements()
            .map(|n| n * T::size_bytes())
            .unwrap_or(0)
    }

    /// The padded storage as a flat slice.
    ///
    /// # Panics
    /// Panics if storage has not been allocated.
    pub fn as_slice(&self) -> &[T] {
        assert!(self.is_allocated(), "tensor storage not allocated");
        &self.storage
    }

    /// The padded storage as a mutable flat slice.
    ///
    /// # Panics
    /// Panics if storage has not been allocated.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        assert!(self.is_allocated(), "tensor storage not allocated");
        &mut self.storage
    }

    /// Flat index of the pixel at padded coordinates `(py, px)`,
    /// channel 0. Padded coordinate `(0, 0)` is the top-left corner of
    /// the margin, not of the valid region.
    #[inline]
    pub fn padded_index(&self, py: usize, px: usize) -> usize {
        (py * self.padded_width() + px) * self.shape.channels()
    }

    /// Flat index of the pixel at valid-region coordinates `(y, x)`,
    /// channel 0.
    #[inline]
    pub fn valid_index(&self, y: usize, x: usize) -> usize {
        self.padded_index(y + self.padding.top, x + self.padding.left)
    }

    /// Reads one element at valid-region coordinates.
    ///
    /// # Panics
    /// Panics if storage is unallocated or the coordinates are out of
    /// range.
    pub fn get(&self, y: usize, x: usize, channel: usize) -> T {
        assert!(
            y < self.shape.height() && x < self.shape.width() && channel < self.shape.channels(),
            "coordinates ({y}, {x}, {channel}) outside {}",
            self.shape
        );
        self.as_slice()[self.valid_index(y, x) + channel]
    }

    /// Copies a dense `[h, w, c]` slice into the valid region,
    /// allocating storage first if needed.
    ///
    /// This is the bridge from the image pipeline: the caller hands over
    /// unpadded pixel data and the tensor places it inside its margin.
    pub fn fill_valid(&mut self, values: &[T]) -> Result<(), TensorError> {
        let expected = self
            .shape
            .checked_num_elements()
            .ok_or_else(|| TensorError::InvalidShape {
                shape: self.shape.clone(),
                detail: "volume overflows usize".into(),
            })?;
        if values.len() != expected {
            return Err(TensorError::ElementCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.ensure_storage()?;

        let (h, w, c) = (self.shape.height(), self.shape.width(), self.shape.channels());
        let row = w * c;
        for y in 0..h {
            let dst = self.valid_index(y, 0);
            self.storage[dst..dst + row].copy_from_slice(&values[y * row..(y + 1) * row]);
        }
        Ok(())
    }

    /// Copies the valid region out into a dense `[h, w, c]` vector.
    ///
    /// # Panics
    /// Panics if storage has not been allocated.
    pub fn valid_to_vec(&self) -> Vec<T> {
        assert!(self.is_allocated(), "tensor storage not allocated");
        let (h, w, c) = (self.shape.height(), self.shape.width(), self.shape.channels());
        let row = w * c;
        let mut out = Vec::with_capacity(h * row);
        for y in 0..h {
            let src = self.valid_index(y, 0);
            out.extend_from_slice(&self.storage[src..src + row]);
        }
        out
    }

    // ── Private helpers ────────────────────────────────────────

    /// Element count of the padded storage plane, overflow-checked.
    fn padded_num_elements(&self) -> Result<usize, TensorError> {
        if !self.shape.is_valid_feature() {
            return Err(TensorError::InvalidShape {
                shape: self.shape.clone(),
                detail: "cannot allocate storage without a positive [h, w, c] shape".into(),
            });
        }
        self.shape
            .height()
            .checked_add(self.padding.vertical())
            .and_then(|ph| {
                let pw = self.shape.width().checked_add(self.padding.horizontal())?;
                ph.checked_mul(pw)?.checked_mul(self.shape.channels())
            })
            .ok_or_else(|| TensorError::InvalidShape {
                shape: self.shape.clone(),
                detail: "padded volume overflows usize".into(),
            })
    }

    /// Allocates a zero-filled buffer for the padded plane, surfacing
    /// allocation failure as an error instead of aborting.
    fn alloc_padded(&self) -> Result<Vec<T>, TensorError> {
        let needed = self.padded_num_elements()?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(needed)
            .map_err(|_| TensorError::AllocationFailed {
                requested_bytes: needed.saturating_mul(T::size_bytes()),
            })?;
        buffer.resize(needed, T::default());
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unshaped_and_unallocated() {
        let t: Tensor<i16> = Tensor::new(-7);
        assert_eq!(t.exponent(), -7);
        assert!(!t.is_allocated());
        assert_eq!(t.size_bytes(), 0);
        assert_eq!(t.shape().rank(), 0);
    }

    #[test]
    fn test_ensure_storage_is_idempotent() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 2), -7);
        assert!(t.ensure_storage().unwrap());
        let ptr = t.as_slice().as_ptr();
        // Second call with unchanged shape: no reallocation.
        assert!(!t.ensure_storage().unwrap());
        assert_eq!(t.as_slice().as_ptr(), ptr);
    }

    #[test]
    fn test_ensure_storage_zero_fills() {
        let mut t: Tensor<i8> = Tensor::with_shape(Shape::hwc(2, 2, 1), 0);
        t.ensure_storage().unwrap();
        assert!(t.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_ensure_storage_requires_shape() {
        let mut t: Tensor<i16> = Tensor::new(0);
        assert!(matches!(
            t.ensure_storage(),
            Err(TensorError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_set_shape_invalidates_storage() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        t.ensure_storage().unwrap();
        t.set_shape(Shape::hwc(8, 8, 1));
        assert!(!t.is_allocated());
        assert!(t.ensure_storage().unwrap());
        assert_eq!(t.as_slice().len(), 64);
    }

    #[test]
    fn test_set_shape_same_shape_keeps_storage() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        t.ensure_storage().unwrap();
        t.set_shape(Shape::hwc(4, 4, 1));
        assert!(t.is_allocated());
    }

    #[test]
    fn test_padded_dimensions() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 6, 3), 0);
        t.set_padding(Padding::new(1, 2, 3, 4)).unwrap();
        assert_eq!(t.padded_height(), 7);
        assert_eq!(t.padded_width(), 13);
        t.ensure_storage().unwrap();
        assert_eq!(t.as_slice().len(), 7 * 13 * 3);
    }

    #[test]
    fn test_set_padding_reembeds_existing_data() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(2, 2, 1), 0);
        t.fill_valid(&[1, 2, 3, 4]).unwrap();
        t.set_padding(Padding::new(1, 1, 1, 1)).unwrap();

        // Valid data survived the re-embedding.
        assert_eq!(t.valid_to_vec(), vec![1, 2, 3, 4]);
        // Margin is zero-filled: padded plane is 4×4 with data centred.
        let s = t.as_slice();
        assert_eq!(s.len(), 16);
        assert_eq!(s[t.padded_index(0, 0)], 0);
        assert_eq!(s[t.padded_index(1, 1)], 1);
        assert_eq!(s[t.padded_index(1, 2)], 2);
        assert_eq!(s[t.padded_index(2, 1)], 3);
        assert_eq!(s[t.padded_index(2, 2)], 4);
    }

    #[test]
    fn test_set_padding_before_allocation_is_metadata_only() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(2, 2, 1), 0);
        t.set_padding(Padding::new(0, 1, 0, 1)).unwrap();
        assert!(!t.is_allocated());
        assert_eq!(t.padding(), Padding::new(0, 1, 0, 1));
    }

    #[test]
    fn test_fill_valid_into_padded_storage() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(2, 3, 1), 0);
        t.set_padding(Padding::new(1, 0, 2, 0)).unwrap();
        t.fill_valid(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(t.get(0, 0, 0), 1);
        assert_eq!(t.get(1, 2, 0), 6);
        assert_eq!(t.valid_to_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_fill_valid_rejects_wrong_length() {
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(2, 2, 1), 0);
        assert!(matches!(
            t.fill_valid(&[1, 2, 3]),
            Err(TensorError::ElementCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        // Requires more bytes than any allocator will grant.
        let mut t: Tensor<i16> = Tensor::with_shape(Shape::hwc(1 << 31, 1 << 31, 2), 0);
        let err = t.ensure_storage().unwrap_err();
        assert!(matches!(
            err,
            TensorError::AllocationFailed { .. } | TensorError::InvalidShape { .. }
        ));
    }

    #[test]
    fn test_get_multi_channel() {
        let mut t: Tensor<i8> = Tensor::with_shape(Shape::hwc(2, 2, 2), 0);
        t.fill_valid(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(t.get(0, 0, 0), 1);
        assert_eq!(t.get(0, 0, 1), 2);
        assert_eq!(t.get(1, 1, 0), 7);
        assert_eq!(t.get(1, 1, 1), 8);
    }
}
