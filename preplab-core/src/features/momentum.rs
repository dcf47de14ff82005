//! Momentum — percentage price change over a lookback period.
//!
//! momentum[t] = close[t] / close[t-period] - 1
//! Column name: `momentum_{period}`. Lookback: period.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    name: String,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "momentum period must be >= 1");
        Self {
            period,
            name: format!("momentum_{period}"),
        }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let prev = closes[i - self.period];
            let curr = closes[i];
            if prev.is_nan() || curr.is_nan() || prev == 0.0 {
                result[i] = f64::NAN;
            } else {
                result[i] = curr / prev - 1.0;
            }
        }

        result
    }
}
