// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `qconv run` command: forward the bundled digit classifier.

use runtime::zoo::{digit_classifier, synthetic_pixels, INPUT_EXPONENT};
use runtime::{LatencyProfile, RunConfig};
use std::path::PathBuf;
use tensor_core::Tensor;

pub fn execute(config: Option<PathBuf>, seed: u64, no_profile: bool) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => RunConfig::from_file(&path)?,
        None => RunConfig {
            seed,
            profile: !no_profile,
            ..Default::default()
        },
    };

    println!("qconv · digit classifier");
    println!("  input:   {} (seed {})", config.input_shape, config.seed);
    println!();

    let mut model = digit_classifier();
    let mut input: Tensor<i16> = Tensor::with_shape(config.input_shape.clone(), INPUT_EXPONENT);
    input.fill_valid(&synthetic_pixels(
        config.seed,
        config.input_shape.num_elements(),
    ))?;

    let scores = if config.profile {
        let mut profile = LatencyProfile::new();
        let scores = model
            .forward_observed(&mut input, &mut profile)?
            .valid_to_vec();
        println!("  {}", profile.summary());
        println!();
        scores
    } else {
        model.forward(&mut input)?.valid_to_vec()
    };

    println!("  {:<8} {:>8}", "Class", "Score");
    println!("  {}", "-".repeat(18));
    for (class, score) in scores.iter().enumerate() {
        println!("  {class:<8} {score:>8}");
    }

    let best = scores
        .iter()
        .enumerate()
        .max_by_key(|(_, &s)| s)
        .map(|(i, _)| i)
        .unwrap_or(0);
    println!();
    println!("  predicted class: {best}");
    Ok(())
}
