// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runs the bundled digit classifier over a synthetic input and prints
//! the per-layer profile.
//!
//! ```bash
//! cargo run --example digit_inference
//! ```

use runtime::zoo::{digit_classifier, synthetic_pixels, DigitClassifier};
use runtime::LatencyProfile;

fn main() -> Result<(), runtime::RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut model = digit_classifier();
    let mut input = DigitClassifier::new_input();
    input
        .fill_valid(&synthetic_pixels(42, input.shape().num_elements()))
        .map_err(|e| runtime::RuntimeError::Tensor {
            layer: "input".into(),
            source: e,
        })?;

    let mut profile = LatencyProfile::new();
    let scores = model
        .forward_observed(&mut input, &mut profile)?
        .valid_to_vec();

    println!("{}", profile.summary());
    for (class, score) in scores.iter().enumerate() {
        println!("  class {class}: {score}");
    }
    let best = scores
        .iter()
        .enumerate()
        .max_by_key(|(_, &s)| s)
        .map(|(i, _)| i)
        .unwrap_or(0);
    println!("predicted class: {best}");
    Ok(())
}
