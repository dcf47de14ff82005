//! Derived feature transforms over the close series.
//!
//! Indicators are pure functions: close series in, numeric series of the
//! same length out. The first `lookback()` values are `f64::NAN` (warmup)
//! and NaN inputs propagate — absence, never zero.
//!
//! # Look-ahead contamination guard
//! No indicator value at date t may depend on observations after t.
//! Every indicator must pass the truncated-vs-full series test.

pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use momentum::Momentum;
pub use moving_average::MovingAverage;
pub use volatility::Volatility;

/// Trait for derived feature transforms.
pub trait Indicator: Send + Sync {
    /// Output column name (e.g., "MA5", "momentum_10").
    fn name(&self) -> &str;

    /// Number of observations needed before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire close series.
    ///
    /// Returns a `Vec<f64>` of the same length as `closes`, with the
    /// first `lookback()` values NaN.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
