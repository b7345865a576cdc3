//! Configuration errors.
//!
//! Visibility passes themselves never fail: degenerate geometry is absorbed by
//! clamping. The only rejectable input is an inconsistent configuration.

use thiserror::Error;

/// Rejected [`crate::VisibilityConfig`] value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  /// A numeric field is NaN or infinite.
  #[error("config field `{field}` must be finite")]
  NonFinite { field: &'static str },

  /// A numeric field lies outside its accepted range.
  #[error("config field `{field}` = {value} is out of range (expected {expected})")]
  OutOfRange {
    field: &'static str,
    value: f64,
    expected: &'static str,
  },

  /// Occlusion sample bounds are inverted.
  #[error("occlusion min_samples ({min}) exceeds max_samples ({max})")]
  SampleRange { min: usize, max: usize },
}
