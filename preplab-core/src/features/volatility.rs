//! Volatility — trailing sample standard deviation of close.
//!
//! Sample (n-1) divisor. Column name: `volatility_{period}`.
//! Lookback: period - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
    name: String,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "volatility period must be >= 2");
        Self {
            period,
            name: format!("volatility_{period}"),
        }
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &closes[(i + 1 - self.period)..=i];

            if window.iter().any(|c| c.is_nan()) {
                continue;
            }

            let mean = window.iter().sum::<f64>() / self.period as f64;
            let sum_sq: f64 = window.iter().map(|c| (c - mean).powi(2)).sum();
            result[i] = (sum_sq / (self.period - 1) as f64).sqrt();
        }

        result
    }
}
