//! Rolling-window configuration for derived features.

use crate::features::{Indicator, Momentum, MovingAverage, Volatility};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Window lengths for each derived-feature family.
///
/// Defaults follow the documented pipeline: moving averages over 5/10/20
/// periods, momentum over 5/10, volatility over 10/20.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWindows {
    pub moving_average: Vec<usize>,
    pub momentum: Vec<usize>,
    pub volatility: Vec<usize>,
}

impl Default for FeatureWindows {
    fn default() -> Self {
        Self {
            moving_average: vec![5, 10, 20],
            momentum: vec![5, 10],
            volatility: vec![10, 20],
        }
    }
}

impl FeatureWindows {
    /// Load windows from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read windows file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse windows from a TOML string, e.g.
    ///
    /// ```toml
    /// moving_average = [5, 10, 20]
    /// momentum = [5, 10]
    /// volatility = [10, 20]
    /// ```
    ///
    /// Omitted lists keep their defaults. Rejects zero-length windows and
    /// volatility windows below 2 (the sample stddev needs two points).
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let windows: Self =
            toml::from_str(content).map_err(|e| format!("parse windows TOML: {e}"))?;
        windows.validate()?;
        Ok(windows)
    }

    fn validate(&self) -> Result<(), String> {
        if self.moving_average.contains(&0) || self.momentum.contains(&0) {
            return Err("window lengths must be >= 1".into());
        }
        if self.volatility.iter().any(|&w| w < 2) {
            return Err("volatility windows must be >= 2".into());
        }
        Ok(())
    }

    /// Instantiate the derived indicators in output-column order:
    /// moving averages, then momentum, then volatility.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        let mut out: Vec<Box<dyn Indicator>> = Vec::new();
        for &w in &self.moving_average {
            out.push(Box::new(MovingAverage::new(w)));
        }
        for &w in &self.momentum {
            out.push(Box::new(Momentum::new(w)));
        }
        for &w in &self.volatility {
            out.push(Box::new(Volatility::new(w)));
        }
        out
    }
}
