// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pure shape and padding inference for 2-D convolution.
//!
//! These functions are the single source of truth for conv geometry.
//! They take the *dilated* filter shape (see [`crate::Filter`], which
//! computes its dilated footprint once at construction) and never touch
//! element data, so layers can call them speculatively during `build`.

use crate::{Padding, PaddingKind, Shape, TensorError};

/// Effective extent of a kernel dimension after inserting dilation gaps:
/// `(kernel - 1) * dilation + 1`.
///
/// # Examples
/// ```
/// use tensor_core::geometry::dilated_extent;
/// assert_eq!(dilated_extent(3, 1), 3);
/// assert_eq!(dilated_extent(3, 2), 5);
/// ```
pub fn dilated_extent(kernel: usize, dilation: usize) -> usize {
    (kernel - 1) * dilation + 1
}

/// Computes a conv layer's output shape.
///
/// `dilated_filter` is rank 4 `[kh, kw, in_c, out_c]` with the spatial
/// dims already dilated. For ordinary convolution the output channel
/// count is the filter's declared `out_c`; for depthwise convolution
/// (`depthwise = true`) it is `input channels × channel multiplier`,
/// where the multiplier sits in the filter's last dimension.
///
/// Per spatial dimension:
/// - VALID: `out = (in - kernel) / stride + 1` (floor), and the kernel
///   must fit inside the input.
/// - SAME / SAME_MXNET: `out = ceil(in / stride)`.
pub fn output_shape(
    input: &Shape,
    dilated_filter: &Shape,
    stride_y: usize,
    stride_x: usize,
    kind: PaddingKind,
    depthwise: bool,
) -> Result<Shape, TensorError> {
    if stride_y == 0 || stride_x == 0 {
        return Err(TensorError::ZeroStride { stride_y, stride_x });
    }
    if !input.is_valid_feature() {
        return Err(TensorError::InvalidShape {
            shape: input.clone(),
            detail: "expected rank-3 [h, w, c] with positive dimensions".into(),
        });
    }
    if dilated_filter.rank() != 4 {
        return Err(TensorError::InvalidShape {
            shape: dilated_filter.clone(),
            detail: "expected rank-4 filter [kh, kw, in_c, out_c]".into(),
        });
    }

    let (in_h, in_w) = (input.height(), input.width());
    let (k_h, k_w) = (dilated_filter.dims()[0], dilated_filter.dims()[1]);

    let (out_h, out_w) = match kind {
        PaddingKind::Valid => {
            if k_h > in_h || k_w > in_w {
                return Err(TensorError::KernelTooLarge {
                    input: input.clone(),
                    kernel: dilated_filter.clone(),
                });
            }
            ((in_h - k_h) / stride_y + 1, (in_w - k_w) / stride_x + 1)
        }
        PaddingKind::Same | PaddingKind::SameMxnet => (
            in_h.div_ceil(stride_y),
            in_w.div_ceil(stride_x),
        ),
    };

    let out_c = if depthwise {
        input.channels() * dilated_filter.dims()[3]
    } else {
        dilated_filter.dims()[3]
    };

    Ok(Shape::hwc(out_h, out_w, out_c))
}

/// Computes the four-sided padding the input must carry so the kernel
/// can sweep the output grid reading padded coordinates only.
///
/// Total padding per spatial dimension is
/// `max((out - 1) * stride + kernel - in, 0)`; an odd total is split with
/// the extra pixel on the trailing edge for [`PaddingKind::Same`] and on
/// the leading edge for [`PaddingKind::SameMxnet`]. VALID always yields
/// the zero margin.
pub fn pad_size(
    output: &Shape,
    input: &Shape,
    dilated_filter: &Shape,
    stride_y: usize,
    stride_x: usize,
    kind: PaddingKind,
) -> Result<Padding, TensorError> {
    if stride_y == 0 || stride_x == 0 {
        return Err(TensorError::ZeroStride { stride_y, stride_x });
    }
    if kind == PaddingKind::Valid {
        return Ok(Padding::ZERO);
    }

    let total_y = ((output.height() - 1) * stride_y + dilated_filter.dims()[0])
        .saturating_sub(input.height());
    let total_x = ((output.width() - 1) * stride_x + dilated_filter.dims()[1])
        .saturating_sub(input.width());

    let pad = match kind {
        // TensorFlow: extra odd pixel on the trailing (bottom/right) edge.
        PaddingKind::Same => Padding::new(
            total_y / 2,
            total_y - total_y / 2,
            total_x / 2,
            total_x - total_x / 2,
        ),
        // MXNET: extra odd pixel on the leading (top/left) edge.
        PaddingKind::SameMxnet => Padding::new(
            total_y - total_y / 2,
            total_y / 2,
            total_x - total_x / 2,
            total_x / 2,
        ),
        PaddingKind::Valid => unreachable!(),
    };
    Ok(pad)
}
