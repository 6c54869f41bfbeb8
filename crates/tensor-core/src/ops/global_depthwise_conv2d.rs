// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Global depthwise convolution: the degenerate depthwise case where the
//! kernel covers the entire input plane.

use super::depthwise_conv2d;
use crate::{Activation, Bias, Element, Filter, Tensor};

/// Computes a whole-plane depthwise convolution, collapsing the spatial
/// dimensions to `1×1`.
///
/// The filter's spatial footprint must equal the input's spatial shape;
/// stride is 1 and padding is VALID by definition, so this reduces to a
/// single window position per channel and delegates to
/// [`depthwise_conv2d`].
pub fn global_depthwise_conv2d<T: Element>(
    output: &mut Tensor<T>,
    input: &Tensor<T>,
    filter: &Filter<'_, T>,
    bias: Option<&Bias<'_, T>>,
    activation: Option<&Activation<'_, T>>,
) {
    debug_assert_eq!(
        (filter.kernel_height(), filter.kernel_width()),
        (input.shape().height(), input.shape().width()),
        "global depthwise filter must cover the full input plane"
    );
    debug_assert_eq!(
        (output.shape().height(), output.shape().width()),
        (1, 1),
        "global depthwise output must be 1x1"
    );
    depthwise_conv2d(output, input, filter, 1, 1, bias, activation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_collapses_plane_to_single_pixel() {
        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(3, 3, 2), 0);
        let mut values = Vec::new();
        for i in 1..=9i16 {
            values.push(i); // channel 0: 1..9
            values.push(10 * i); // channel 1: 10..90
        }
        input.fill_valid(&values).unwrap();

        let weights = vec![1i16; 3 * 3 * 2];
        let filter = Filter::undilated(&weights, 0, Shape::filter(3, 3, 2, 1)).unwrap();
        let mut output = Tensor::with_shape(Shape::hwc(1, 1, 2), 0);
        output.ensure_storage().unwrap();

        global_depthwise_conv2d(&mut output, &input, &filter, None, None);
        assert_eq!(output.get(0, 0, 0), 45);
        assert_eq!(output.get(0, 0, 1), 450);
    }

    #[test]
    fn test_bias_applies_per_channel() {
        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(2, 2, 2), 0);
        input.fill_valid(&[1, -1, 1, -1, 1, -1, 1, -1]).unwrap();

        let weights = vec![1i16; 2 * 2 * 2];
        let filter = Filter::undilated(&weights, 0, Shape::filter(2, 2, 2, 1)).unwrap();
        let bias_vals = [100i16, 200];
        let bias = Bias::new(&bias_vals, 0).unwrap();
        let mut output = Tensor::with_shape(Shape::hwc(1, 1, 2), 0);
        output.ensure_storage().unwrap();

        global_depthwise_conv2d(&mut output, &input, &filter, Some(&bias), None);
        assert_eq!(output.get(0, 0, 0), 104);
        assert_eq!(output.get(0, 0, 1), 196);
    }
}
