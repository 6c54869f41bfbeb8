// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference observability.
//!
//! [`LayerObserver`] is an injectable hook invoked around each layer's
//! execution — the diagnostic counterpart of what the original firmware
//! compiled in and out with a debug flag. The default observer is a
//! no-op; [`LatencyProfile`] collects per-layer timing and memory data
//! for tuning a model on its target.

use std::time::Duration;

/// Receives one event per executed layer, plus a completion event per
/// forward pass.
///
/// Implementations must be cheap: the hook runs between layers, never
/// inside a kernel's element loop.
pub trait LayerObserver {
    /// Called after a layer finishes executing.
    fn record(&mut self, layer: &str, elapsed: Duration, output_bytes: usize);

    /// Called once when the whole forward pass finishes.
    fn complete(&mut self, _total: Duration) {}
}

/// The do-nothing observer used by plain `forward`.
#[derive(Debug, Default)]
pub struct NullObserver;

impl LayerObserver for NullObserver {
    fn record(&mut self, _layer: &str, _elapsed: Duration, _output_bytes: usize) {}
}

/// Timing and memory data for a single executed layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LayerTiming {
    /// Layer name.
    pub layer: String,
    /// Time spent executing the layer.
    pub elapsed: Duration,
    /// Storage footprint of the layer's output in bytes.
    pub output_bytes: usize,
}

/// Collects per-layer records across one or more forward passes.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LatencyProfile {
    /// One record per executed layer, in execution order.
    pub layers: Vec<LayerTiming>,
    /// Wall-clock time of the most recent forward pass.
    pub total: Duration,
}

impl LatencyProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards collected records.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.total = Duration::ZERO;
    }

    /// Sum of per-layer execution times.
    pub fn layer_time(&self) -> Duration {
        self.layers.iter().map(|l| l.elapsed).sum()
    }

    /// Largest single output footprint seen, in bytes.
    pub fn peak_output_bytes(&self) -> usize {
        self.layers.iter().map(|l| l.output_bytes).max().unwrap_or(0)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let peak_kb = self.peak_output_bytes() as f64 / 1024.0;
        format!(
            "Forward: {:.2}ms total, {} layers ({:.2}ms in kernels), peak output {:.1} KB",
            self.total.as_secs_f64() * 1000.0,
            self.layers.len(),
            self.layer_time().as_secs_f64() * 1000.0,
            peak_kb,
        )
    }
}

impl LayerObserver for LatencyProfile {
    fn record(&mut self, layer: &str, elapsed: Duration, output_bytes: usize) {
        self.layers.push(LayerTiming {
            layer: layer.to_string(),
            elapsed,
            output_bytes,
        });
    }

    fn complete(&mut self, total: Duration) {
        self.total = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_observer_is_silent() {
        let mut obs = NullObserver;
        obs.record("l0", Duration::from_millis(1), 100);
        obs.complete(Duration::from_millis(2));
    }

    #[test]
    fn test_profile_collects_records() {
        let mut p = LatencyProfile::new();
        p.record("l0", Duration::from_millis(5), 1000);
        p.record("l1", Duration::from_millis(3), 4000);
        p.complete(Duration::from_millis(10));

        assert_eq!(p.layers.len(), 2);
        assert_eq!(p.layer_time(), Duration::from_millis(8));
        assert_eq!(p.peak_output_bytes(), 4000);
        assert_eq!(p.total, Duration::from_millis(10));
    }

    #[test]
    fn test_summary_format() {
        let mut p = LatencyProfile::new();
        p.record("l0", Duration::from_millis(1), 2048);
        p.complete(Duration::from_millis(2));
        let s = p.summary();
        assert!(s.contains("1 layers"));
        assert!(s.contains("2.0 KB"));
    }

    #[test]
    fn test_clear() {
        let mut p = LatencyProfile::new();
        p.record("l0", Duration::from_millis(1), 10);
        p.clear();
        assert!(p.layers.is_empty());
        assert_eq!(p.peak_output_bytes(), 0);
    }

    #[test]
    fn test_serialises_to_json() {
        let mut p = LatencyProfile::new();
        p.record("l0", Duration::from_millis(1), 10);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"l0\""));
    }
}
