// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Run configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! seed = 42
//! profile = true
//!
//! [input_shape]
//! dims = [28, 28, 1]
//! ```

use crate::RuntimeError;
use std::path::Path;
use tensor_core::Shape;

/// Configuration for a CLI inference run.
///
/// Scalar fields precede the shape table so the TOML serialiser emits
/// them in a valid order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunConfig {
    /// Seed for the synthetic input generator.
    pub seed: u64,
    /// Whether to collect and print a per-layer latency profile.
    #[serde(default = "default_true")]
    pub profile: bool,
    /// Shape of the synthetic input feature map.
    pub input_shape: Shape,
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::Config(format!("TOML serialise error: {e}")))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            profile: true,
            input_shape: Shape::hwc(28, 28, 1),
        }
    }
}
