// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # qconv
//!
//! Command-line interface for the quantized CNN inference runtime.
//!
//! ## Usage
//! ```bash
//! # Run the bundled digit classifier over a synthetic input
//! qconv run --seed 42
//!
//! # Inspect the classifier's per-layer shapes and memory
//! qconv inspect
//!
//! # One-off conv geometry query
//! qconv shapes --input 28,28,1 --kernel 3,3 --stride 2,2 --padding same
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "qconv",
    about = "Quantized CNN inference runtime for memory-constrained microcontrollers",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bundled digit classifier over a synthetic input.
    Run {
        /// Path to a TOML run configuration (overrides CLI arguments).
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Seed for the synthetic input generator.
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Disable the per-layer latency profile.
        #[arg(long)]
        no_profile: bool,
    },

    /// Inspect the bundled digit classifier: layer table and memory
    /// estimates.
    Inspect,

    /// Compute output shape and padding for one conv configuration.
    Shapes {
        /// Input shape as `H,W,C`.
        #[arg(short, long)]
        input: String,

        /// Kernel spatial size as `KH,KW`.
        #[arg(short, long)]
        kernel: String,

        /// Stride as `SY,SX`.
        #[arg(short, long, default_value = "1,1")]
        stride: String,

        /// Dilation as `DY,DX`.
        #[arg(short, long, default_value = "1,1")]
        dilation: String,

        /// Padding convention: valid, same, same_mxnet.
        #[arg(short, long, default_value = "valid")]
        padding: String,

        /// Output channels (ordinary conv) or channel multiplier
        /// (with --depthwise).
        #[arg(short, long, default_value_t = 1)]
        out_channels: usize,

        /// Use the depthwise output-channel rule.
        #[arg(long)]
        depthwise: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            seed,
            no_profile,
        } => commands::run::execute(config, seed, no_profile),
        Commands::Inspect => commands::inspect::execute(),
        Commands::Shapes {
            input,
            kernel,
            stride,
            dilation,
            padding,
            out_channels,
            depthwise,
        } => commands::shapes::execute(
            &input,
            &kernel,
            &stride,
            &dilation,
            &padding,
            out_channels,
            depthwise,
        ),
    }
}
