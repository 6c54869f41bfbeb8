// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Ordinary 2-D convolution over fixed-point HWC tensors.

use super::{activate, requantize};
use crate::{Activation, Bias, Element, Filter, Tensor};

/// Computes `activation(conv2d(input, filter) + bias)` into `output`.
///
/// `output` must already be shaped (by the layer's `build`) and its
/// storage allocated; this function never reallocates. The input is read
/// through padded coordinates: output position `(oy, ox)` reads the
/// window whose top-left corner sits at padded coordinate
/// `(oy * stride_y, ox * stride_x)`, so the padding placed on the input
/// at build time makes every read in-bounds.
///
/// Filter elements are HWIO row-major: `[kh][kw][in_c][out_c]`.
///
/// # Panics
/// Debug builds assert the contract (allocated output, matching channel
/// counts); release builds rely on the layer having validated it.
pub fn conv2d<T: Element>(
    output: &mut Tensor<T>,
    input: &Tensor<T>,
    filter: &Filter<'_, T>,
    stride_y: usize,
    stride_x: usize,
    bias: Option<&Bias<'_, T>>,
    activation: Option<&Activation<'_, T>>,
) {
    let in_c = input.shape().channels();
    let (out_h, out_w, out_c) = (
        output.shape().height(),
        output.shape().width(),
        output.shape().channels(),
    );
    debug_assert!(output.is_allocated(), "output storage must be pre-allocated");
    debug_assert_eq!(filter.input_channels(), in_c, "input channel mismatch");
    debug_assert_eq!(filter.output_channels(), out_c, "output channel mismatch");

    let (kh, kw) = (filter.kernel_height(), filter.kernel_width());
    let (dil_y, dil_x) = filter.dilation();
    let weights = filter.elements();

    let acc_exponent = input.exponent() + filter.exponent();
    let out_exponent = output.exponent();

    let in_pw = input.padded_width();
    let in_data = input.as_slice();

    let out_pad = output.padding();
    let out_pw = output.padded_width();
    let out_data = output.as_mut_slice();

    for oy in 0..out_h {
        for ox in 0..out_w {
            let out_base = ((oy + out_pad.top) * out_pw + ox + out_pad.left) * out_c;
            for oc in 0..out_c {
                let mut acc: i64 = 0;
                for ky in 0..kh {
                    let iy = oy * stride_y + ky * dil_y;
                    for kx in 0..kw {
                        let ix = ox * stride_x + kx * dil_x;
                        let in_base = (iy * in_pw + ix) * in_c;
                        let w_base = (ky * kw + kx) * in_c * out_c;
                        for ic in 0..in_c {
                            acc += in_data[in_base + ic].widen()
                                * weights[w_base + ic * out_c + oc].widen();
                        }
                    }
                }
                if let Some(bias) = bias {
                    acc += requantize(bias.at(oc).widen(), bias.exponent(), acc_exponent);
                }
                let value = activate(requantize(acc, acc_exponent, out_exponent), oc, activation);
                out_data[out_base + oc] = T::saturate_from(value);
            }
        }
    }
}
