// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Layer nodes and model orchestration for the quantized CNN inference
//! engine.
//!
//! The runtime takes:
//! - Fixed-point tensors and weight views from `tensor-core`.
//! - The fused compute primitives from `tensor-core::ops`.
//!
//! And wraps them in the two-phase build/call lifecycle: `build` infers
//! output shapes and propagates padding requirements backward one layer;
//! `call` executes with lazily allocated, shape-keyed buffers. The
//! [`Model`] wrapper guarantees shape metadata is rebuilt exactly when
//! the input shape changes and never consulted stale.
//!
//! # Execution model
//! Single-threaded and synchronous: layers form a strict data dependency
//! chain, so the engine prescribes no inter-layer parallelism. Any SIMD
//! or multi-core acceleration belongs inside the compute primitives,
//! invisible to this crate.

mod config;
mod error;
pub mod layer;
mod model;
mod observe;
pub mod zoo;

pub use config::RunConfig;
pub use error::RuntimeError;
pub use layer::{Conv2d, DepthwiseConv2d, GlobalDepthwiseConv2d, Layer, LayerPlan, LayerReport};
pub use model::{Graph, Model};
pub use observe::{LatencyProfile, LayerObserver, LayerTiming, NullObserver};
