// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A 10-class digit classifier over 28×28×1 Q16 input.
//!
//! The topology is the classic embedded tutorial stack:
//!
//! ```text
//! 28×28×1 ─ conv 3×3 s2 SAME + bias + relu ─→ 14×14×8
//!         ─ depthwise 3×3 SAME + relu      ─→ 14×14×8
//!         ─ conv 1×1 + bias + relu         ─→ 14×14×16
//!         ─ depthwise 3×3 s2 SAME_MXNET
//!           + leaky relu                   ─→ 7×7×16
//!         ─ global depthwise 7×7 + bias    ─→ 1×1×16
//!         ─ conv 1×1 + bias                ─→ 1×1×10
//! ```
//!
//! Coefficient tables are process-lifetime statics, initialised once and
//! borrowed by the layers without copying. A production build links a
//! trained table; this module synthesises a deterministic stand-in so
//! the full graph can be exercised without shipping model data.

use crate::layer::{
    call_observed, Conv2d, DepthwiseConv2d, GlobalDepthwiseConv2d, Layer, LayerReport,
};
use crate::{Graph, LayerObserver, Model, RuntimeError};
use std::sync::OnceLock;
use tensor_core::{Activation, Bias, Filter, PaddingKind, Shape, Tensor};

/// Fixed-point exponent of the expected input (pixel / 128).
pub const INPUT_EXPONENT: i32 = -7;

/// Exponent shared by the feature maps.
const FEATURE_EXPONENT: i32 = -7;

/// Exponent of the synthesised filter tables.
const FILTER_EXPONENT: i32 = -8;

/// Exponent of the synthesised bias tables (accumulator scale).
const BIAS_EXPONENT: i32 = FEATURE_EXPONENT + FILTER_EXPONENT;

/// The input shape the classifier is wired for.
pub fn input_shape() -> Shape {
    Shape::hwc(28, 28, 1)
}

// ── Coefficient tables ─────────────────────────────────────────

struct Coefficients {
    l1_filter: Filter<'static, i16>,
    l1_bias: Bias<'static, i16>,
    l1_relu: Activation<'static, i16>,
    l2_depth_filter: Filter<'static, i16>,
    l2_depth_relu: Activation<'static, i16>,
    l2_point_filter: Filter<'static, i16>,
    l2_point_bias: Bias<'static, i16>,
    l2_point_relu: Activation<'static, i16>,
    l3_depth_filter: Filter<'static, i16>,
    l3_depth_leaky: Activation<'static, i16>,
    pool_filter: Filter<'static, i16>,
    pool_bias: Bias<'static, i16>,
    head_filter: Filter<'static, i16>,
    head_bias: Bias<'static, i16>,
}

/// Deterministic stand-in for a trained coefficient table.
fn table(seed: u64, len: usize, amplitude: i64) -> &'static [i16] {
    let mut state = seed | 1;
    let values: Vec<i16> = (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state % (2 * amplitude as u64 + 1)) as i64 - amplitude) as i16
        })
        .collect();
    Box::leak(values.into_boxed_slice())
}

fn coefficients() -> &'static Coefficients {
    static COEFFICIENTS: OnceLock<Coefficients> = OnceLock::new();
    COEFFICIENTS.get_or_init(|| {
        let leaky_slope: &'static [i16] = Box::leak(vec![64i16].into_boxed_slice());
        Coefficients {
            l1_filter: Filter::undilated(
                table(0x11, 3 * 3 * 1 * 8, 32),
                FILTER_EXPONENT,
                Shape::filter(3, 3, 1, 8),
            )
            .expect("l1 filter table is well-formed"),
            l1_bias: Bias::new(table(0x12, 8, 512), BIAS_EXPONENT)
                .expect("l1 bias table is well-formed"),
            l1_relu: Activation::relu(),
            l2_depth_filter: Filter::undilated(
                table(0x21, 3 * 3 * 8, 32),
                FILTER_EXPONENT,
                Shape::filter(3, 3, 8, 1),
            )
            .expect("l2 depthwise filter table is well-formed"),
            l2_depth_relu: Activation::relu(),
            l2_point_filter: Filter::undilated(
                table(0x22, 8 * 16, 32),
                FILTER_EXPONENT,
                Shape::filter(1, 1, 8, 16),
            )
            .expect("l2 pointwise filter table is well-formed"),
            l2_point_bias: Bias::new(table(0x23, 16, 512), BIAS_EXPONENT)
                .expect("l2 bias table is well-formed"),
            l2_point_relu: Activation::relu(),
            l3_depth_filter: Filter::undilated(
                table(0x31, 3 * 3 * 16, 32),
                FILTER_EXPONENT,
                Shape::filter(3, 3, 16, 1),
            )
            .expect("l3 depthwise filter table is well-formed"),
            // slope 64 at 2^-9 = 0.125.
            l3_depth_leaky: Activation::leaky_relu(leaky_slope, -9)
                .expect("leaky slope table is well-formed"),
            pool_filter: Filter::undilated(
                table(0x41, 7 * 7 * 16, 8),
                FILTER_EXPONENT,
                Shape::filter(7, 7, 16, 1),
            )
            .expect("pool filter table is well-formed"),
            pool_bias: Bias::new(table(0x42, 16, 512), BIAS_EXPONENT)
                .expect("pool bias table is well-formed"),
            head_filter: Filter::undilated(
                table(0x51, 16 * 10, 32),
                FILTER_EXPONENT,
                Shape::filter(1, 1, 16, 10),
            )
            .expect("head filter table is well-formed"),
            head_bias: Bias::new(table(0x52, 10, 512), BIAS_EXPONENT)
                .expect("head bias table is well-formed"),
        }
    })
}

// ── The classifier ─────────────────────────────────────────────

/// The hand-wired digit classifier graph.
pub struct DigitClassifier {
    l1: Conv2d<'static, i16>,
    l2_depth: DepthwiseConv2d<'static, i16>,
    l2_point: Conv2d<'static, i16>,
    l3_depth: DepthwiseConv2d<'static, i16>,
    pool: GlobalDepthwiseConv2d<'static, i16>,
    head: Conv2d<'static, i16>,
}

impl DigitClassifier {
    /// Wires the fixed layer sequence against the static coefficient
    /// tables.
    pub fn new() -> Self {
        let c = coefficients();
        Self {
            l1: Conv2d::new(
                FEATURE_EXPONENT,
                &c.l1_filter,
                Some(&c.l1_bias),
                Some(&c.l1_relu),
                PaddingKind::Same,
                2,
                2,
                "l1_conv",
            ),
            l2_depth: DepthwiseConv2d::new(
                FEATURE_EXPONENT,
                &c.l2_depth_filter,
                None,
                Some(&c.l2_depth_relu),
                PaddingKind::Same,
                1,
                1,
                "l2_depth",
            ),
            l2_point: Conv2d::new(
                FEATURE_EXPONENT,
                &c.l2_point_filter,
                Some(&c.l2_point_bias),
                Some(&c.l2_point_relu),
                PaddingKind::Valid,
                1,
                1,
                "l2_point",
            ),
            l3_depth: DepthwiseConv2d::new(
                FEATURE_EXPONENT,
                &c.l3_depth_filter,
                None,
                Some(&c.l3_depth_leaky),
                PaddingKind::SameMxnet,
                2,
                2,
                "l3_depth",
            ),
            pool: GlobalDepthwiseConv2d::new(
                FEATURE_EXPONENT,
                &c.pool_filter,
                Some(&c.pool_bias),
                None,
                "pool",
            ),
            head: Conv2d::new(
                FEATURE_EXPONENT,
                &c.head_filter,
                Some(&c.head_bias),
                None,
                PaddingKind::Valid,
                1,
                1,
                "head",
            ),
        }
    }

    /// An unallocated input tensor with the expected shape and exponent.
    pub fn new_input() -> Tensor<i16> {
        Tensor::with_shape(input_shape(), INPUT_EXPONENT)
    }
}

impl Default for DigitClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph<i16> for DigitClassifier {
    fn build(&mut self, input: &mut Tensor<i16>) -> Result<(), RuntimeError> {
        self.l1.build(input)?;
        self.l2_depth.build(self.l1.output_mut())?;
        self.l2_point.build(self.l2_depth.output_mut())?;
        self.l3_depth.build(self.l2_point.output_mut())?;
        self.pool.build(self.l3_depth.output_mut())?;
        self.head.build(self.pool.output_mut())?;
        Ok(())
    }

    fn call(&mut self, input: &Tensor<i16>) -> Result<&Tensor<i16>, RuntimeError> {
        let x = self.l1.call(input)?;
        let x = self.l2_depth.call(x)?;
        let x = self.l2_point.call(x)?;
        let x = self.l3_depth.call(x)?;
        let x = self.pool.call(x)?;
        self.head.call(x)
    }

    fn call_observed(
        &mut self,
        input: &Tensor<i16>,
        observer: &mut dyn LayerObserver,
    ) -> Result<&Tensor<i16>, RuntimeError> {
        let x = call_observed(&mut self.l1, input, observer)?;
        let x = call_observed(&mut self.l2_depth, x, observer)?;
        let x = call_observed(&mut self.l2_point, x, observer)?;
        let x = call_observed(&mut self.l3_depth, x, observer)?;
        let x = call_observed(&mut self.pool, x, observer)?;
        call_observed(&mut self.head, x, observer)
    }

    fn describe(&self) -> Vec<LayerReport> {
        vec![
            self.l1.report(),
            self.l2_depth.report(),
            self.l2_point.report(),
            self.l3_depth.report(),
            self.pool.report(),
            self.head.report(),
        ]
    }
}

/// The digit classifier wrapped in its orchestrating [`Model`].
pub fn digit_classifier() -> Model<DigitClassifier> {
    Model::new("digit-classifier", DigitClassifier::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoo::synthetic_pixels;

    #[test]
    fn test_forward_produces_ten_scores() {
        let mut model = digit_classifier();
        let mut input = DigitClassifier::new_input();
        input
            .fill_valid(&synthetic_pixels(42, input_shape().num_elements()))
            .unwrap();

        let output = model.forward(&mut input).unwrap();
        assert_eq!(output.shape(), &Shape::hwc(1, 1, 10));
        assert_eq!(output.valid_to_vec().len(), 10);
    }

    #[test]
    fn test_forward_is_deterministic() {
        let mut model = digit_classifier();
        let pixels = synthetic_pixels(7, input_shape().num_elements());

        let mut input = DigitClassifier::new_input();
        input.fill_valid(&pixels).unwrap();
        let first = model.forward(&mut input).unwrap().valid_to_vec();

        let mut input2 = DigitClassifier::new_input();
        input2.fill_valid(&pixels).unwrap();
        let second = model.forward(&mut input2).unwrap().valid_to_vec();

        assert_eq!(first, second);
        assert_eq!(model.rebuilds(), 1);
    }

    #[test]
    fn test_wrong_input_plane_is_config_error() {
        // The global pool layer is wired for a 7×7 plane; a 32×32 input
        // reaches it as 8×8 and must fail fast during build.
        let mut model = digit_classifier();
        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(32, 32, 1), INPUT_EXPONENT);
        input.fill_valid(&vec![0i16; 32 * 32]).unwrap();

        assert!(matches!(
            model.forward(&mut input),
            Err(RuntimeError::LayerConfig { .. })
        ));
    }

    #[test]
    fn test_describe_lists_all_layers() {
        let mut model = digit_classifier();
        let mut input = DigitClassifier::new_input();
        input
            .fill_valid(&synthetic_pixels(1, input_shape().num_elements()))
            .unwrap();
        model.forward(&mut input).unwrap();

        let reports = model.describe();
        assert_eq!(reports.len(), 6);
        assert_eq!(reports[0].name, "l1_conv");
        assert_eq!(reports[0].output_shape, Shape::hwc(14, 14, 8));
        assert_eq!(reports[3].output_shape, Shape::hwc(7, 7, 16));
        assert_eq!(reports[4].kind, "global_depthwise_conv2d");
        assert_eq!(reports[5].output_shape, Shape::hwc(1, 1, 10));
    }
}
