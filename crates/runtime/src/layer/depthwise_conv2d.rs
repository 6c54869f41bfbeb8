// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The depthwise 2-D convolution layer node:
//! `activation(depthwise_conv2d(input, filter) + bias)`.

use super::{validate_call_input, validate_feature_input, Layer, LayerPlan};
use crate::RuntimeError;
use tensor_core::{
    geometry, ops, Activation, Bias, Element, Filter, Padding, PaddingKind, Shape, Tensor,
};

/// A depthwise convolution layer.
///
/// Identical lifecycle to [`Conv2d`](super::Conv2d); the difference is
/// the channel rule — each input channel produces `multiplier` output
/// channels instead of every output channel reading every input channel.
pub struct DepthwiseConv2d<'a, T: Element> {
    name: String,
    filter: &'a Filter<'a, T>,
    bias: Option<&'a Bias<'a, T>>,
    activation: Option<&'a Activation<'a, T>>,
    padding_kind: PaddingKind,
    stride_y: usize,
    stride_x: usize,
    input_padding: Padding,
    built_for: Option<Shape>,
    output: Tensor<T>,
}

impl<'a, T: Element> DepthwiseConv2d<'a, T> {
    /// Creates a depthwise conv layer.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        output_exponent: i32,
        filter: &'a Filter<'a, T>,
        bias: Option<&'a Bias<'a, T>>,
        activation: Option<&'a Activation<'a, T>>,
        padding_kind: PaddingKind,
        stride_y: usize,
        stride_x: usize,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filter,
            bias,
            activation,
            padding_kind,
            stride_y,
            stride_x,
            input_padding: Padding::ZERO,
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
        ops::depthwise_conv2d(
            output,
            input,
            self.filter,
            self.stride_y,
            self.stride_x,
            self.bias,
            self.activation,
        );
        Ok(())
    }

    fn validate_channels(&self, out_channels: usize) -> Result<(), RuntimeError> {
        if let Some(bias) = self.bias {
            if bias.channels() != out_channels {
                return Err(RuntimeError::LayerConfig {
                    layer: self.name.clone(),
                    detail: format!(
                        "bias covers {} channels, output has {out_channels}",
                        bias.channels()
                    ),
                });
            }
        }
        if let Some(activation) = self.activation {
            if let Some(slopes) = activation.slope_channels() {
                if slopes != out_channels {
                    return Err(RuntimeError::LayerConfig {
                        layer: self.name.clone(),
                        detail: format!(
                            "activation carries {slopes} slopes, output has {out_channels}"
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<T: Element> Layer<T> for DepthwiseConv2d<'_, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "depthwise_conv2d"
    }

    fn plan(&self, input_shape: &Shape) -> Result<LayerPlan, RuntimeError> {
        validate_feature_input(&self.name, input_shape)?;
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
            self.stride_y,
            self.stride_x,
            self.padding_kind,
            true,
        )
        .map_err(|e| RuntimeError::tensor(&self.name, e))?;
        self.validate_channels(output_shape.channels())?;

        let input_padding = geometry::pad_size(
            &output_shape,
            input_shape,
            self.filter.dilated_shape(),
            self.stride_y,
            self.stride_x,
            self.padding_kind,
        )
        .map_err(|e| RuntimeError::tensor(&self.name, e))?;

        Ok(LayerPlan {
            output_shape,
            input_padding,
        })
    }

    fn build(&mut self, input: &mut Tensor<T>) -> Result<(), RuntimeError> {
        let plan = self.plan(input.shape())?;
        self.output.set_shape(plan.output_shape);
        input
            .set_padding(plan.input_padding)
            .map_err(|e| RuntimeError::tensor(&self.name, e))?;
        self.input_padding = plan.input_padding;
        self.built_for = Some(input.shape().clone());
        tracing::debug!(
            layer = %self.name,
            output = %self.output.shape(),
            padding = %self.input_padding,
            "built depthwise_conv2d"
        );
        Ok(())
    }

    fn call(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>, RuntimeError> {
        validate_call_input(&self.name, self.built_for.as_ref(), self.input_padding, input)?;
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
        ops::depthwise_conv2d(
            &mut self.output,
            input,
            self.filter,
            self.stride_y,
            self.stride_x,
            self.bias,
            self.activation,
        );
        Ok(&self.output)
    }

    fn output(&self) -> &Tensor<T> {
        &self.output
    }

    fn output_mut(&mut self) -> &mut Tensor<T> {
        &mut self.output
    }

    fn input_padding(&self) -> Padding {
        self.input_padding
    }
}
