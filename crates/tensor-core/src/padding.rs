// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Padding conventions and four-sided padding margins.

use std::fmt;

/// The implicit-border-padding rule a conv layer follows.
///
/// The three conventions differ in how much total padding is added and,
/// for an odd total, which edge receives the extra pixel:
///
/// - [`Valid`](PaddingKind::Valid) — no implicit padding; the kernel only
///   visits fully covered positions.
/// - [`Same`](PaddingKind::Same) — TensorFlow rule: output is
///   `ceil(input / stride)` and the extra odd pixel lands on the
///   **trailing** (bottom/right) edge.
/// - [`SameMxnet`](PaddingKind::SameMxnet) — same total padding, but the
///   extra odd pixel lands on the **leading** (top/left) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingKind {
    /// No implicit padding.
    Valid,
    /// SAME in TensorFlow style (extra pixel trailing).
    Same,
    /// SAME in MXNET style (extra pixel leading).
    SameMxnet,
}

impl PaddingKind {
    /// Parses a padding kind from a config/CLI string.
    ///
    /// Accepts snake_case names and common aliases
    /// (`"same-tf"`, `"tf"`, `"mxnet"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "valid" => Some(Self::Valid),
            "same" | "same_tf" | "same-tf" | "tf" => Some(Self::Same),
            "same_mxnet" | "same-mxnet" | "mxnet" => Some(Self::SameMxnet),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Same => "same",
            Self::SameMxnet => "same_mxnet",
        }
    }
}

impl fmt::Display for PaddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The margin (in pixels) surrounding a tensor's valid data region.
///
/// A producing layer promises this margin is present (zero-filled) around
/// its output so the consuming kernel can read padded coordinates without
/// bounds checks or copies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Padding {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding {
    /// The zero margin.
    pub const ZERO: Padding = Padding {
        top: 0,
        bottom: 0,
        left: 0,
        right: 0,
    };

    /// Creates a padding margin from the four edge sizes.
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Returns `true` if all four edges are zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Total vertical margin (`top + bottom`).
    pub fn vertical(&self) -> usize {
        self.top + self.bottom
    }

    /// Total horizontal margin (`left + right`).
    pub fn horizontal(&self) -> usize {
        self.left + self.right
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[t{} b{} l{} r{}]",
            self.top, self.bottom, self.left, self.right
        )
    }
}
