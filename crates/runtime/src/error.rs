// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for layer execution and model orchestration.

use tensor_core::{Padding, Shape, TensorError};

/// Errors that can occur while building or executing a model.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A layer was wired with incompatible configuration (channel
    /// mismatch, wrong slope table size, degenerate input). These
    /// indicate a programming error in how the model was assembled and
    /// are not recoverable at runtime.
    #[error("invalid configuration in layer '{layer}': {detail}")]
    LayerConfig { layer: String, detail: String },

    /// `call` ran before `build` produced shape metadata.
    #[error("layer '{layer}' called before build")]
    NotBuilt { layer: String },

    /// `call` received an input whose shape differs from the one the
    /// layer was last built for.
    #[error("stale shape in layer '{layer}': built for {built}, input is {actual}")]
    StaleShape {
        layer: String,
        built: Shape,
        actual: Shape,
    },

    /// `call` received an input whose padding margin does not match the
    /// one recorded at build time.
    #[error("padding mismatch in layer '{layer}': expected {expected}, input carries {actual}")]
    PaddingMismatch {
        layer: String,
        expected: Padding,
        actual: Padding,
    },

    /// A tensor operation (geometry, allocation) failed inside a layer.
    #[error("tensor error in layer '{layer}': {source}")]
    Tensor {
        layer: String,
        #[source]
        source: TensorError,
    },

    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RuntimeError {
    /// Wraps a [`TensorError`] with the offending layer's name.
    pub(crate) fn tensor(layer: &str, source: TensorError) -> Self {
        Self::Tensor {
            layer: layer.to_string(),
            source,
        }
    }
}
