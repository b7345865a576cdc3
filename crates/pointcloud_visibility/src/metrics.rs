//! Engine-agnostic metrics for visibility passes.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use pointcloud_visibility::metrics::COLLECT_METRICS;
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let metrics = engine.metrics();
//! println!("avg pass: {:.1}us", metrics.avg_pass_us());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::walker::VisitorKind;

/// Runtime toggle for metrics collection.
/// Set to false to disable metrics gathering at runtime.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Fixed-capacity history, oldest evicted first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl RollingWindow<u64> {
    pub fn sum(&self) -> u64 {
        self.buffer.iter().sum()
    }

    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = self.buffer.iter().min()?;
        let max = self.buffer.iter().max()?;
        Some((*min, *max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128) // ~2 seconds of passes at 60fps
    }
}

/// Pass-level counters and timings.
#[derive(Debug, Clone, Default)]
pub struct VisibilityMetrics {
    /// Whole-pass durations in microseconds.
    pub pass_timings: RollingWindow<u64>,
    /// Per-walk durations, indexed by [`VisitorKind::index`].
    pub step_timings: [RollingWindow<u64>; 8],
    pub last_pass_us: u64,

    /// Passes that ran to completion.
    pub passes_completed: u64,
    /// Passes refused (paused, stopped or no view).
    pub passes_skipped: u64,
    /// Passes where the budget governor rescaled.
    pub budget_rescales: u64,

    pub fixed_visibility_applied: u64,
    /// Fixed-visibility calls dropped on lock contention.
    pub fixed_visibility_contended: u64,
}

impl VisibilityMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset timings and counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_pass(&mut self, timing_us: u64, budget_rescaled: bool) {
        if !is_enabled() {
            return;
        }
        self.pass_timings.push(timing_us);
        self.last_pass_us = timing_us;
        self.passes_completed += 1;
        if budget_rescaled {
            self.budget_rescales += 1;
        }
    }

    pub fn record_step(&mut self, kind: VisitorKind, timing_us: u64) {
        if is_enabled() {
            self.step_timings[kind.index()].push(timing_us);
        }
    }

    pub fn record_skipped(&mut self) {
        if is_enabled() {
            self.passes_skipped += 1;
        }
    }

    pub fn record_fixed_visibility(&mut self, applied: bool) {
        if !is_enabled() {
            return;
        }
        if applied {
            self.fixed_visibility_applied += 1;
        } else {
            self.fixed_visibility_contended += 1;
        }
    }

    pub fn avg_pass_us(&self) -> f64 {
        self.pass_timings.average()
    }

    pub fn avg_step_us(&self, kind: VisitorKind) -> f64 {
        self.step_timings[kind.index()].average()
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());

        window.push(10u64);
        window.push(20);
        window.push(30);
        assert_eq!(window.sum(), 60);
        assert_eq!(window.average(), 20.0);

        // Oldest evicted
        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.min_max(), Some((20, 40)));
        assert_eq!(window.last(), Some(&40));
    }

    #[test]
    fn test_pass_recording() {
        let mut metrics = VisibilityMetrics::new();
        metrics.record_pass(1000, false);
        metrics.record_pass(3000, true);
        metrics.record_skipped();

        assert_eq!(metrics.passes_completed, 2);
        assert_eq!(metrics.passes_skipped, 1);
        assert_eq!(metrics.budget_rescales, 1);
        assert_eq!(metrics.avg_pass_us(), 2000.0);
        assert_eq!(metrics.last_pass_us, 3000);
    }

    #[test]
    fn test_step_recording() {
        let mut metrics = VisibilityMetrics::new();
        metrics.record_step(VisitorKind::ClipCheck, 40);
        metrics.record_step(VisitorKind::ClipCheck, 60);

        assert_eq!(metrics.avg_step_us(VisitorKind::ClipCheck), 50.0);
        assert_eq!(metrics.avg_step_us(VisitorKind::FrustumCheck), 0.0);
    }

    #[test]
    fn test_fixed_visibility_counters() {
        let mut metrics = VisibilityMetrics::new();
        metrics.record_fixed_visibility(true);
        metrics.record_fixed_visibility(false);
        metrics.record_fixed_visibility(false);
        assert_eq!(metrics.fixed_visibility_applied, 1);
        assert_eq!(metrics.fixed_visibility_contended, 2);

        metrics.reset();
        assert_eq!(metrics.fixed_visibility_contended, 0);
    }
}
