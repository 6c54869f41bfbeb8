// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CLI subcommand implementations.

pub mod inspect;
pub mod run;
pub mod shapes;

/// Initialises tracing based on `-v` verbosity counting.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parses a comma-separated list of positive integers, e.g. `"28,28,1"`.
pub fn parse_dims(s: &str, expected: usize) -> anyhow::Result<Vec<usize>> {
    let dims: Vec<usize> = s
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow::anyhow!("invalid dimension list '{s}': {e}"))?;
    if dims.len() != expected {
        anyhow::bail!("expected {expected} comma-separated values, got '{s}'");
    }
    Ok(dims)
}
