// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model orchestration: the build-on-shape-change state machine.
//!
//! ```text
//! Model (unbuilt)
//!     │  forward(input with shape S)
//!     ▼
//! built for S ──── forward(shape S) ──── call only, zero allocations
//!     │
//!     │  forward(shape S')
//!     ▼
//! built for S' — every layer's build re-ran in declaration order
//! ```
//!
//! [`Model::forward`] is the only entry point external callers should
//! use: it guarantees shape metadata is never stale relative to the
//! tensor actually passed in, rebuilding the whole chain before any
//! `call` runs when the input shape changes.

use crate::{layer::LayerReport, LayerObserver, NullObserver, RuntimeError};
use std::time::Instant;
use tensor_core::{Element, Padding, Shape, Tensor};

/// A fixed topology of layers wired by hand.
///
/// Concrete models declare their layers as struct fields and chain them
/// in `build`/`call` — the graph is fixed at compile time; the engine
/// does not support runtime graph mutation.
pub trait Graph<T: Element> {
    /// Runs every layer's `build` in declaration order, propagating
    /// shapes forward and padding requirements one layer backward.
    fn build(&mut self, input: &mut Tensor<T>) -> Result<(), RuntimeError>;

    /// Runs every layer's `call` in declaration order and returns the
    /// final output tensor.
    fn call(&mut self, input: &Tensor<T>) -> Result<&Tensor<T>, RuntimeError>;

    /// Like [`call`](Self::call), threading an observer through each
    /// layer. The default ignores the observer.
    fn call_observed(
        &mut self,
        input: &Tensor<T>,
        _observer: &mut dyn LayerObserver,
    ) -> Result<&Tensor<T>, RuntimeError> {
        self.call(input)
    }

    /// Structural description of the layers, for inspection tooling.
    fn describe(&self) -> Vec<LayerReport> {
        Vec::new()
    }
}

/// Wraps a [`Graph`] with the shape-tracking that decides when `build`
/// must re-run.
pub struct Model<G> {
    name: String,
    graph: G,
    built_for: Option<Shape>,
    input_padding: Padding,
    rebuilds: usize,
}

impl<G> Model<G> {
    /// Creates an unbuilt model around a wired graph.
    pub fn new(name: impl Into<String>, graph: G) -> Self {
        Self {
            name: name.into(),
            graph,
            built_for: None,
            input_padding: Padding::ZERO,
            rebuilds: 0,
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The input shape the model is currently built for, if any.
    pub fn built_shape(&self) -> Option<&Shape> {
        self.built_for.as_ref()
    }

    /// How many times the layer chain has been (re)built.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Runs inference, rebuilding shape metadata first iff the input
    /// shape differs from the last build.
    pub fn forward<T>(&mut self, input: &mut Tensor<T>) -> Result<&Tensor<T>, RuntimeError>
    where
        T: Element,
        G: Graph<T>,
    {
        self.forward_observed(input, &mut NullObserver)
    }

    /// [`forward`](Self::forward) with an observer threaded through each
    /// layer's execution.
    pub fn forward_observed<T>(
        &mut self,
        input: &mut Tensor<T>,
        observer: &mut dyn LayerObserver,
    ) -> Result<&Tensor<T>, RuntimeError>
    where
        T: Element,
        G: Graph<T>,
    {
        if self.built_for.as_ref() != Some(input.shape()) {
            tracing::debug!(
                model = %self.name,
                shape = %input.shape(),
                "input shape changed, rebuilding layer chain"
            );
            self.graph.build(input)?;
            self.built_for = Some(input.shape().clone());
            self.input_padding = input.padding();
            self.rebuilds += 1;
        } else {
            // A fresh input tensor of a known shape may not carry the
            // margin the first layer's kernel reads through yet.
            input
                .set_padding(self.input_padding)
                .map_err(|e| RuntimeError::Tensor {
                    layer: self.name.clone(),
                    source: e,
                })?;
        }

        let started = Instant::now();
        let output = self.graph.call_observed(input, observer)?;
        let total = started.elapsed();
        observer.complete(total);
        tracing::debug!(
            model = %self.name,
            elapsed_us = total.as_micros() as u64,
            "forward pass complete"
        );
        Ok(output)
    }

    /// Structural description of the wired layers.
    pub fn describe<T>(&self) -> Vec<LayerReport>
    where
        T: Element,
        G: Graph<T>,
    {
        self.graph.describe()
    }

    /// The wrapped graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Conv2d, Layer};
    use tensor_core::{Filter, PaddingKind};

    /// Minimal hand-wired graph: one SAME conv that accepts any input
    /// size.
    struct SingleConv<'a> {
        conv: Conv2d<'a, i16>,
    }

    impl<'a> Graph<i16> for SingleConv<'a> {
        fn build(&mut self, input: &mut Tensor<i16>) -> Result<(), RuntimeError> {
            self.conv.build(input)
        }

        fn call(&mut self, input: &Tensor<i16>) -> Result<&Tensor<i16>, RuntimeError> {
            self.conv.call(input)
        }

        fn call_observed(
            &mut self,
            input: &Tensor<i16>,
            observer: &mut dyn LayerObserver,
        ) -> Result<&Tensor<i16>, RuntimeError> {
            crate::layer::call_observed(&mut self.conv, input, observer)
        }

        fn describe(&self) -> Vec<LayerReport> {
            vec![self.conv.report()]
        }
    }

    fn model_with_filter(weights: &[i16]) -> Model<SingleConv<'_>> {
        let filter = Filter::undilated(weights, 0, Shape::filter(3, 3, 1, 1)).unwrap();
        let filter = Box::leak(Box::new(filter));
        let conv = Conv2d::new(0, filter, None, None, PaddingKind::Same, 1, 1, "conv");
        Model::new("single-conv", SingleConv { conv })
    }

    #[test]
    fn test_first_forward_builds() {
        let weights = vec![1i16; 9];
        let mut model = model_with_filter(&weights);
        assert!(model.built_shape().is_none());

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        input.fill_valid(&[1i16; 16]).unwrap();
        let out = model.forward(&mut input).unwrap();
        assert_eq!(out.shape(), &Shape::hwc(4, 4, 1));
        assert_eq!(model.built_shape(), Some(&Shape::hwc(4, 4, 1)));
        assert_eq!(model.rebuilds(), 1);
    }

    #[test]
    fn test_same_shape_skips_rebuild() {
        let weights = vec![1i16; 9];
        let mut model = model_with_filter(&weights);

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        input.fill_valid(&[1i16; 16]).unwrap();
        model.forward(&mut input).unwrap();
        model.forward(&mut input).unwrap();
        model.forward(&mut input).unwrap();
        assert_eq!(model.rebuilds(), 1);
    }

    #[test]
    fn test_shape_change_rebuilds_and_roundtrip_matches() {
        let weights = vec![1i16; 9];
        let mut model = model_with_filter(&weights);

        let values_a: Vec<i16> = (1..=16).collect();
        let mut a: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        a.fill_valid(&values_a).unwrap();
        let first = model.forward(&mut a).unwrap().valid_to_vec();

        let mut b: Tensor<i16> = Tensor::with_shape(Shape::hwc(6, 6, 1), 0);
        b.fill_valid(&vec![1i16; 36]).unwrap();
        model.forward(&mut b).unwrap();

        // Same shape A again: third rebuild, identical result.
        let mut a2: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        a2.fill_valid(&values_a).unwrap();
        let third = model.forward(&mut a2).unwrap().valid_to_vec();

        assert_eq!(model.rebuilds(), 3);
        assert_eq!(first, third);
    }

    #[test]
    fn test_fresh_input_gets_padding_reapplied() {
        let weights = vec![1i16; 9];
        let mut model = model_with_filter(&weights);

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        input.fill_valid(&[1i16; 16]).unwrap();
        let first = model.forward(&mut input).unwrap().valid_to_vec();

        // A brand-new tensor with the same shape but no margin yet.
        let mut fresh: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        fresh.fill_valid(&[1i16; 16]).unwrap();
        let second = model.forward(&mut fresh).unwrap().valid_to_vec();

        assert_eq!(model.rebuilds(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_forward_observed_records_layers() {
        let weights = vec![1i16; 9];
        let mut model = model_with_filter(&weights);

        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        input.fill_valid(&[1i16; 16]).unwrap();

        let mut profile = crate::LatencyProfile::new();
        model.forward_observed(&mut input, &mut profile).unwrap();

        assert_eq!(profile.layers.len(), 1);
        assert_eq!(profile.layers[0].layer, "conv");
        assert!(profile.layers[0].output_bytes > 0);
    }

    #[test]
    fn test_describe_reports_layers() {
        let weights = vec![1i16; 9];
        let mut model = model_with_filter(&weights);
        let mut input: Tensor<i16> = Tensor::with_shape(Shape::hwc(4, 4, 1), 0);
        input.fill_valid(&[1i16; 16]).unwrap();
        model.forward(&mut input).unwrap();

        let reports = model.describe();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, "conv2d");
        assert_eq!(reports[0].output_shape, Shape::hwc(4, 4, 1));
    }
}
