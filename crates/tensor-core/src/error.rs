// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction, geometry, and allocation.

use crate::Shape;

/// Errors that can occur while constructing quantized values, inferring
/// conv geometry, or allocating tensor storage.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// A shape is malformed for the requested use (wrong rank, zero
    /// spatial dimension, volume overflow).
    #[error("invalid shape {shape}: {detail}")]
    InvalidShape { shape: Shape, detail: String },

    /// A constant's element slice does not cover its declared shape.
    #[error("element count mismatch: shape expects {expected} elements, got {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// A dilated kernel does not fit inside the input under VALID padding.
    #[error("dilated kernel {kernel} exceeds input {input} under VALID padding")]
    KernelTooLarge { input: Shape, kernel: Shape },

    /// Stride must be at least 1 in both spatial dimensions.
    #[error("stride must be positive, got ({stride_y}, {stride_x})")]
    ZeroStride { stride_y: usize, stride_x: usize },

    /// The heap could not provide storage for a tensor's elements.
    ///
    /// On memory-constrained targets this is the most likely runtime
    /// failure mode, so it surfaces as an explicit error rather than an
    /// abort.
    #[error("tensor allocation failed: requested {requested_bytes} bytes")]
    AllocationFailed { requested_bytes: usize },
}
