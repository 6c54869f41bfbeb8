// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Depthwise 2-D convolution over fixed-point HWC tensors.

use super::{activate, requantize};
use crate::{Activation, Bias, Element, Filter, Tensor};

/// Computes `activation(depthwise_conv2d(input, filter) + bias)` into
/// `output`.
///
/// Each output channel depends on exactly one input channel: with a
/// filter shaped `[kh, kw, in_c, multiplier]`, input channel `ic`
/// produces output channels `ic * multiplier .. (ic + 1) * multiplier`.
///
/// Shares the padded-read and single-requantization contract of
/// [`conv2d`](super::conv2d).
pub fn depthwise_conv2d<T: Element>(
    output: &mut Tensor<T>,
    input: &Tensor<T>,
    filter: &Filter<'_, T>,
    stride_y: usize,
    stride_x: usize,
    bias: Option<&Bias<'_, T>>,
    activation: Option<&Activation<'_, T>>,
) {
    let in_c = input.shape().channels();
    let multiplier = filter.output_channels();
    let (out_h, out_w, out_c) = (
        output.shape().height(),
        output.shape().width(),
        output.shape().channels(),
    );
    debug_assert!(output.is_allocated(), "output storage must be pre-allocated");
    debug_assert_eq!(filter.input_channels(), in_c, "input channel mismatch");
    debug_assert_eq!(in_c * multiplier, out_c, "depthwise channel rule violated");

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
            for ic in 0..in_c {
                for m in 0..multiplier {
                    let oc = ic * multiplier + m;
                    let mut acc: i64 = 0;
                    for ky in 0..kh {
                        let iy = oy * stride_y + ky * dil_y;
                        for kx in 0..kw {
                            let ix = ox * stride_x + kx * dil_x;
                            let in_idx = (iy * in_pw + ix) * in_c + ic;
                            let w_idx = ((ky * kw + kx) * in_c + ic) * multiplier + m;
                            acc += in_data[in_idx].widen() * weights[w_idx].widen();
                        }
                    }
                    if let Some(bias) = bias {
                        acc += requantize(bias.at(oc).widen(), bias.exponent(), acc_exponent);
                    }
                    let value =
                        activate(requantize(acc, acc_exponent, out_exponent), oc, activation);
                    out_data[out_base + oc] = T::saturate_from(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Padding, Shape};

    fn input_tensor(shape: Shape, values: &[i16]) -> Tensor<i16> {
        let mut t = Tensor::with_shape(shape, 0);
        t.fill_valid(values).unwrap();
        t
    }

    fn output_tensor(shape: Shape, exponent: i32) -> Tensor<i16> {
        let mut t = Tensor::with_shape(shape, exponent);
        t.ensure_storage().unwrap();
        t
    }

    #[test]
    fn test_channels_stay_separate() {
        // 1×1 per-channel scaling: channel 0 × 2, channel 1 × 3.
        let input = input_tensor(Shape::hwc(2, 2, 2), &[1, 1, 2, 2, 3, 3, 4, 4]);
        let weights = [2i16, 3];
        let filter = Filter::undilated(&weights, 0, Shape::filter(1, 1, 2, 1)).unwrap();
        let mut output = output_tensor(Shape::hwc(2, 2, 2), 0);

        depthwise_conv2d(&mut output, &input, &filter, 1, 1, None, None);
        assert_eq!(output.valid_to_vec(), vec![2, 3, 4, 6, 6, 9, 8, 12]);
    }

    #[test]
    fn test_channel_multiplier_ordering() {
        // multiplier 2: input channel ic feeds output channels 2ic, 2ic+1.
        let input = input_tensor(Shape::hwc(1, 1, 2), &[10, 100]);
        // [kh=1][kw=1][ic][m] → ic0: (1, 2), ic1: (3, 4).
        let weights = [1i16, 2, 3, 4];
        let filter = Filter::undilated(&weights, 0, Shape::filter(1, 1, 2, 2)).unwrap();
        let mut output = output_tensor(Shape::hwc(1, 1, 4), 0);

        depthwise_conv2d(&mut output, &input, &filter, 1, 1, None, None);
        assert_eq!(output.valid_to_vec(), vec![10, 20, 300, 400]);
    }

    #[test]
    fn test_3x3_window_sum_per_channel() {
        let values: Vec<i16> = (1..=9).collect();
        let input = input_tensor(Shape::hwc(3, 3, 1), &values);
        let weights = [1i16; 9];
        let filter = Filter::undilated(&weights, 0, Shape::filter(3, 3, 1, 1)).unwrap();
        let mut output = output_tensor(Shape::hwc(1, 1, 1), 0);

        depthwise_conv2d(&mut output, &input, &filter, 1, 1, None, None);
        assert_eq!(output.get(0, 0, 0), 45);
    }

    #[test]
    fn test_padded_margin_reads_as_zero() {
        let mut input = Tensor::with_shape(Shape::hwc(2, 2, 1), 0);
        input.set_padding(Padding::new(1, 0, 1, 0)).unwrap();
        input.fill_valid(&[1, 2, 3, 4]).unwrap();

        let weights = [1i16; 4];
        let filter = Filter::undilated(&weights, 0, Shape::filter(2, 2, 1, 1)).unwrap();
        let mut output = output_tensor(Shape::hwc(2, 2, 1), 0);

        depthwise_conv2d(&mut output, &input, &filter, 1, 1, None, None);
        // Window at (0,0) covers only margin + value 1.
        assert_eq!(output.valid_to_vec(), vec![1, 3, 4, 10]);
    }

    #[test]
    fn test_bias_and_leaky_relu() {
        let input = input_tensor(Shape::hwc(1, 1, 2), &[4, -16]);
        let weights = [1i16, 1];
        let filter = Filter::undilated(&weights, 0, Shape::filter(1, 1, 2, 1)).unwrap();
        let bias_vals = [0i16, 4];
        let bias = Bias::new(&bias_vals, 0).unwrap();
        // slope 64 at 2^-7 = 0.5.
        let slope = [64i16];
        let leaky = Activation::leaky_relu(&slope, -7).unwrap();
        let mut output = output_tensor(Shape::hwc(1, 1, 2), 0);

        depthwise_conv2d(&mut output, &input, &filter, 1, 1, Some(&bias), Some(&leaky));
        // channel 0: 4 → positive, unchanged.
        // channel 1: -16 + 4 = -12 → × 0.5 = -6.
        assert_eq!(output.valid_to_vec(), vec![4, -6]);
    }
}
