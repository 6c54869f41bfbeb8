// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The global depthwise convolution layer node.
//!
//! The degenerate depthwise case: the kernel's spatial footprint equals
//! the full input plane, so stride is fixed at 1, padding is always
//! VALID, and the output collapses to `1×1×C`. It therefore carries no
//! stride or padding configuration of its own.

use super::{validate_call_input, validate_feature_input, Layer, LayerPlan};
use crate::RuntimeError;
use tensor_core::{geometry, ops, Activation, Bias, Element, Filter, Padding, PaddingKind, Shape, Tensor};

/// A whole-plane depthwise convolution layer (global pooling with
/// learned per-pixel weights).
pub struct GlobalDepthwiseConv2d<'a, T: Element> {
    name: String,
    filter: &'a Filter<'a, T>,
    bias: Option<&'a Bias<'a, T>>,
    activation: Option<&'a Activation<'a, T>>,
    built_for: Option<Shape>,
    output: Tensor<T>,
}

impl<'a, T: Element> GlobalDepthwiseConv2d<'a, T> {
    /// Creates a global depthwise conv layer.
    pub fn new(
        output_exponent: i32,
        filter: &'a Filter<'a, T>,
        bias: Option<&'a Bias<'a, T>>,
        activation: Option<&'a Activation<'a, T>>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filter,
            bias,
            activation,
            built_for: None,
            output: Tensor::new(output_exponent),
        }
    }

    /// Executes into a caller-managed output tensor.
    pub fn call_into(
        &self,
        output: &mut Tensor<T>,
        input: &Tensor<T>,
    ) -> Result<(), RuntimeError> {
        let plan = self.plan(input.shape())?;
        validate_call_input(&self.name, Some(input.shape()), plan.input_padding, input)?;
        output.set_shape(plan.output_shape);
        output
            .ensure_storage()
            .map_err(|e| RuntimeError::tensor(&self.name, e))?;
        ops::global_depthwise_conv2d(output, input, self.filter, self.bias, self.activation);
        Ok(())
    }
}

impl<T: Element> Layer<T> for GlobalDepthwiseConv2d<'_, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "global_depthwise_conv2d"
    }

    fn plan(&self, input_shape: &Shape) -> Result<LayerPlan, RuntimeError> {
        validate_feature_input(&self.name, input_shape)?;
        if (self.filter.kernel_height(), self.filter.kernel_width())
            != (input_shape.height(), input_shape.width())
        {
            return Err(RuntimeError::LayerConfig {
                layer: self.name.clone(),
                detail: format!(
                    "global filter is {}x{} but input plane is {}x{}",
                    self.filter.kernel_height(),
                    self.filter.kernel_width(),
                    input_shape.height(),
                    input_shape.width()
                ),
            });
        }
        if self.filter.input_channels() != input_shape.channels() {
            return Err(RuntimeError::LayerConfig {
                layer: self.name.clone(),
                detail: format!(
                    "filter expects {} input channels, input has {}",
                    self.filter.input_channels(),
                    input_shape.channels()
                ),
            });
        }

        let output_shape = geometry::output_shape(
            input_shape,
            self.filter.dilated_shape(),
            1,
            1,
            PaddingKind::Valid,
            true,
        )
        .map_err(|e| RuntimeError::tensor(&self.name, e))?;

        if let Some(bias) = self.bias {
            if bias.channels() != output_shape.channels() {
                return Err(RuntimeError::LayerConfig {
                    layer: self.name.clone(),
                    detail: format!(
                        "bias covers {} channels, output has {}",
                        bias.channels(),
                        output_shape.channels()
                    ),
                });
            }
        }
        if let Some(activation) = self.activation {
            if let Some(slopes) = activation.slope_channels() {
                if slopes != output_shape.channels() {
                    return Err(RuntimeError::LayerConfig {
                        layer: self.name.clone(),
                        detail: format!(
                            "activation carries {slopes} slopes, output has {}",
                            output_shape.channels()
                        ),
                    });
                }
            }
        }

        Ok(LayerPlan {
            output_shape,
            input_padding: Padding::ZERO,
        })
    }

    fn build(&mut self, input: &mut Tensor<T>) -> Result<(), RuntimeError> {
        let plan = self.plan(input.shape())?;
        self.output.set_shape(plan.output_shape);
        // No spatial padding is possible: the kernel already covers the
        // whole plane, so the input keeps its zero margin.
        input
            .set_padding(Padding::ZERO)
            .map_err(|e| RuntimeError::tensor(&self.name, e))?;
        self.built_for = Some(input.shape().clone());
        tracing::debug!(
            layer = %self.name,
            output = %self.output.shape(),
            "built global_depthwise_conv2d"
        );
        Ok(())
    }

    fn call(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>, RuntimeError> {
        validate_call_input(&self.name, self.built_for.as_ref(), Padding::ZERO, input)?;
        let allocated = self
            .output
            .ensure_storage()
            .map_err(|e| RuntimeError::tensor(&self.name, e))?;
        if allocated {
            tracing::debug!(
                layer = %self.name,
                bytes = self.output.size_bytes(),
                "allocated output storage"
            );
        }
        ops::global_depthwise_conv2d(&mut self.output, input, self.filter, self.bias, self.activation);
        Ok(&self.output)
    }

    fn output(&self) -> &Tensor<T> {
        &self.output
    }

    fn output_mut(&mut self) -> &mut Tensor<T> {
        &mut self.output
    }

    fn input_padding(&self) -> Padding {
        Padding::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_collapses_to_1x1() {
        let w = vec![1i16; 7 * 7 * 16];
        let filter = Filter::undilated(&w, 0, Shape::filter(7, 7, 16, 1)).unwrap();
        let mut layer = GlobalDepthwiseConv2d::new(0, &filter, None, None, "pool");

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(7, 7, 16), 0);
        layer.build(&mut input).unwrap();
        assert_eq!(layer.output().shape(), &Shape::hwc(1, 1, 16));
        assert!(input.padding().is_zero());
    }

    #[test]
    fn test_spatial_mismatch_is_config_error() {
        let w = vec![1i16; 7 * 7 * 4];
        let filter = Filter::undilated(&w, 0, Shape::filter(7, 7, 4, 1)).unwrap();
        let mut layer = GlobalDepthwiseConv2d::new(0, &filter, None, None, "pool");

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(8, 8, 4), 0);
        assert!(matches!(
            layer.build(&mut input),
            Err(RuntimeError::LayerConfig { .. })
        ));
    }

    #[test]
    fn test_call_sums_each_channel_plane() {
        let w = vec![1i16; 2 * 2 * 2];
        let filter = Filter::undilated(&w, 0, Shape::filter(2, 2, 2, 1)).unwrap();
        let mut layer = GlobalDepthwiseConv2d::new(0, &filter, None, None, "pool");

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(2, 2, 2), 0);
        layer.build(&mut input).unwrap();
        input.fill_valid(&[1, 10, 2, 20, 3, 30, 4, 40]).unwrap();

        let out = layer.call(&input).unwrap();
        assert_eq!(out.valid_to_vec(), vec![10, 100]);
    }
}
