// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `qconv inspect` command: display the bundled model's structure and
//! memory estimates.

use runtime::zoo::{digit_classifier, input_shape, DigitClassifier};

pub fn execute() -> anyhow::Result<()> {
    println!("qconv · model inspector");
    println!();

    // One pass over a zero input populates shapes, padding, and buffer
    // footprints.
    let mut model = digit_classifier();
    let mut input = DigitClassifier::new_input();
    input.fill_valid(&vec![0i16; input.shape().num_elements()])?;
    model.forward(&mut input)?;

    let reports = model.describe();
    println!("  Model: {} (input {})", model.name(), input_shape());
    println!();
    println!(
        "  {:<4} {:<12} {:<26} {:<14} {:>16} {:>8}",
        "Idx", "Name", "Type", "Output", "Padding", "Bytes",
    );
    println!("  {}", "-".repeat(86));

    let mut total_bytes = 0usize;
    let mut peak_bytes = 0usize;
    for (idx, report) in reports.iter().enumerate() {
        total_bytes += report.output_bytes;
        peak_bytes = peak_bytes.max(report.output_bytes);
        println!(
            "  {:<4} {:<12} {:<26} {:<14} {:>16} {:>8}",
            idx,
            report.name,
            report.kind,
            report.output_shape.to_string(),
            report.input_padding.to_string(),
            report.output_bytes,
        );
    }

    println!();
    println!(
        "  Total activation storage: {:.1} KB (largest layer {:.1} KB)",
        total_bytes as f64 / 1024.0,
        peak_bytes as f64 / 1024.0,
    );
    Ok(())
}
