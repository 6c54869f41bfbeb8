// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `qconv shapes` command: one-off conv geometry queries.

use super::parse_dims;
use tensor_core::{geometry, PaddingKind, Shape};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    input: &str,
    kernel: &str,
    stride: &str,
    dilation: &str,
    padding: &str,
    out_channels: usize,
    depthwise: bool,
) -> anyhow::Result<()> {
    let input_dims = parse_dims(input, 3)?;
    let kernel_dims = parse_dims(kernel, 2)?;
    let stride_dims = parse_dims(stride, 2)?;
    let dilation_dims = parse_dims(dilation, 2)?;
    let kind = PaddingKind::from_str_loose(padding).ok_or_else(|| {
        anyhow::anyhow!("unknown padding '{padding}'; expected valid, same, or same_mxnet")
    })?;

    let input_shape = Shape::hwc(input_dims[0], input_dims[1], input_dims[2]);
    let dilated = Shape::filter(
        geometry::dilated_extent(kernel_dims[0], dilation_dims[0]),
        geometry::dilated_extent(kernel_dims[1], dilation_dims[1]),
        input_dims[2],
        out_channels,
    );

    let output = geometry::output_shape(
        &input_shape,
        &dilated,
        stride_dims[0],
        stride_dims[1],
        kind,
        depthwise,
    )?;
    let pad = geometry::pad_size(
        &output,
        &input_shape,
        &dilated,
        stride_dims[0],
        stride_dims[1],
        kind,
    )?;

    println!("qconv · conv geometry");
    println!();
    println!("  input:          {input_shape}");
    println!(
        "  kernel:         {}x{} (dilated {}x{})",
        kernel_dims[0],
        kernel_dims[1],
        dilated.dims()[0],
        dilated.dims()[1],
    );
    println!("  stride:         {}x{}", stride_dims[0], stride_dims[1]);
    println!("  padding:        {kind}");
    println!(
        "  channel rule:   {}",
        if depthwise { "depthwise" } else { "ordinary" }
    );
    println!();
    println!("  output shape:   {output}");
    println!("  input padding:  {pad}");
    Ok(())
}
