// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Fixed-point tensor types and quantized convolution kernels for
//! microcontroller-class inference workloads.
//!
//! This crate provides:
//! - [`Tensor`] — a mutable fixed-point HWC feature map with lazy,
//!   idempotent storage allocation and explicit padding margins.
//! - [`Constant`], [`Filter`], [`Bias`], [`Activation`] — non-owning
//!   views over process-lifetime weight tables.
//! - [`Shape`] / [`Padding`] / [`PaddingKind`] — geometry descriptors.
//! - [`geometry`] — pure output-shape and padding inference for the
//!   VALID / SAME / SAME_MXNET conventions.
//! - [`ops`] — the fused conv / depthwise-conv / global-depthwise-conv
//!   compute primitives.
//!
//! # Design Goals
//! - Allocation happens at most once per distinct shape, never per call.
//! - Kernels read padded coordinates — no bounds checks, no copies in
//!   the hot path.
//! - Clean error types via `thiserror`; allocation failure is an error,
//!   not an abort.

mod constant;
mod element;
mod error;
pub mod geometry;
mod padding;
mod shape;
mod tensor;

pub mod ops;

pub use constant::{Activation, ActivationKind, Bias, Constant, Filter};
pub use element::Element;
pub use error::TensorError;
pub use padding::{Padding, PaddingKind};
pub use shape::Shape;
pub use tensor::Tensor;
