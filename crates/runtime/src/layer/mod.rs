// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer nodes: the build/call lifecycle around the compute primitives.
//!
//! Every layer follows the same two-phase protocol:
//!
//! ```text
//! plan(input_shape)  — pure: (output_shape, required_input_padding)
//!      │
//! build(&mut input)  — applies the plan: shapes the owned output tensor
//!      │               and writes the padding requirement onto the input
//!      ▼
//! call(&input)       — allocates output storage once, dispatches to the
//!                      fused compute primitive, returns the output
//! ```
//!
//! `plan` is side-effect free and safe to call speculatively. `build` is
//! the only place a layer touches a tensor it does not own, and it does
//! so through an explicit `&mut` parameter — the padding requirement
//! propagates exactly one layer backward, before any `call` runs.
//! `call` fails fast on stale shape metadata instead of silently
//! computing wrong-shaped output.

mod conv2d;
mod depthwise_conv2d;
mod global_depthwise_conv2d;

pub use conv2d::Conv2d;
pub use depthwise_conv2d::DepthwiseConv2d;
pub use global_depthwise_conv2d::GlobalDepthwiseConv2d;

use crate::{LayerObserver, RuntimeError};
use std::time::Instant;
use tensor_core::{Element, Padding, Shape, Tensor};

/// The result of a layer's pure shape inference: where its output lands
/// and what margin its input must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPlan {
    /// Shape of the layer's output feature map.
    pub output_shape: Shape,
    /// Padding the input tensor must carry for the kernel's padded reads.
    pub input_padding: Padding,
}

/// Structural description of one layer, used by model inspection.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LayerReport {
    /// Diagnostic layer name.
    pub name: String,
    /// Layer kind label (`"conv2d"`, `"depthwise_conv2d"`, ...).
    pub kind: &'static str,
    /// Output shape (empty until the layer has been built).
    pub output_shape: Shape,
    /// Padding the layer requires on its input.
    pub input_padding: Padding,
    /// Storage footprint of the output tensor in bytes.
    pub output_bytes: usize,
}

/// The capability interface every layer kind implements.
///
/// Concrete models hold layers as plain struct fields and wire them by
/// hand; this trait exists so orchestration helpers (observed execution,
/// inspection) can treat the kinds uniformly without virtual dispatch in
/// the hot path.
pub trait Layer<T: Element> {
    /// Diagnostic name.
    fn name(&self) -> &str;

    /// Layer kind label.
    fn kind(&self) -> &'static str;

    /// Pure shape/padding inference for a prospective input shape.
    fn plan(&self, input_shape: &Shape) -> Result<LayerPlan, RuntimeError>;

    /// Applies the plan: shapes the owned output tensor and records the
    /// padding requirement on `input`.
    fn build(&mut self, input: &mut Tensor<T>) -> Result<(), RuntimeError>;

    /// Executes the layer into its owned output tensor, allocating its
    /// storage on first use.
    fn call(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>, RuntimeError>;

    /// The owned output tensor.
    fn output(&self) -> &Tensor<T>;

    /// Mutable access to the owned output tensor (used when wiring the
    /// next layer's `build`).
    fn output_mut(&mut self) -> &mut Tensor<T>;

    /// Padding this layer wrote onto its input at build time.
    fn input_padding(&self) -> Padding;

    /// Structural description for inspection.
    fn report(&self) -> LayerReport {
        LayerReport {
            name: self.name().to_string(),
            kind: self.kind(),
            output_shape: self.output().shape().clone(),
            input_padding: self.input_padding(),
            output_bytes: self.output().size_bytes(),
        }
    }
}

/// Executes a layer while reporting timing and output size to an
/// observer.
///
/// This is the injectable diagnostic hook around each layer's execution;
/// it stays out of the per-element hot path entirely.
pub fn call_observed<'l, T, L>(
    layer: &'l mut L,
    input: &Tensor<T>,
    observer: &mut dyn LayerObserver,
) -> Result<&'l Tensor<T>, RuntimeError>
where
    T: Element,
    L: Layer<T> + ?Sized,
{
    let started = Instant::now();
    layer.call(input)?;
    let elapsed = started.elapsed();
    let output = layer.output();
    observer.record(layer.name(), elapsed, output.size_bytes());
    Ok(output)
}

/// Checks the precondition every layer shares: a rank-3 input with
/// positive spatial dimensions.
pub(crate) fn validate_feature_input(layer: &str, shape: &Shape) -> Result<(), RuntimeError> {
    if !shape.is_valid_feature() {
        return Err(RuntimeError::LayerConfig {
            layer: layer.to_string(),
            detail: format!("input shape {shape} is not a positive [h, w, c] feature map"),
        });
    }
    Ok(())
}

/// Shared `call` preconditions: built, same shape as built, padding in
/// place, input data present.
pub(crate) fn validate_call_input<T: Element>(
    layer: &str,
    built_for: Option<&Shape>,
    expected_padding: Padding,
    input: &Tensor<T>,
) -> Result<(), RuntimeError> {
    let built = built_for.ok_or_else(|| RuntimeError::NotBuilt {
        layer: layer.to_string(),
    })?;
    if input.shape() != built {
        return Err(RuntimeError::StaleShape {
            layer: layer.to_string(),
            built: built.clone(),
            actual: input.shape().clone(),
        });
    }
    if input.padding() != expected_padding {
        return Err(RuntimeError::PaddingMismatch {
            layer: layer.to_string(),
            expected: expected_padding,
            actual: input.padding(),
        });
    }
    if !input.is_allocated() {
        return Err(RuntimeError::LayerConfig {
            layer: layer.to_string(),
            detail: "input tensor has no element storage".into(),
        });
    }
    Ok(())
}
