//! Tunable constants for the exact plan search and the inverse solver.
//!
//! The window and threshold-range factors are empirical pruning constants,
//! not bounds derived from an error estimate. A plan is only minimal with
//! respect to the window they define.

use serde::{Deserialize, Serialize};

use crate::plan::{PlanError, TestCase};
use crate::roots::RootOptions;

/// Multipliers applied to an expected success count to bound the threshold scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFactors {
    pub low: f64,
    pub high: f64,
}

/// How the thresholds of a single sample size are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdScan {
    /// Binary-search the feasible interval using monotonicity of both error
    /// rates in `r`, then score only the feasible thresholds.
    #[default]
    Bisect,
    /// Evaluate every threshold in the range.
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Lower edge of the sample-size window as a fraction of the normal seed.
    pub window_low: f64,
    /// Upper edge of the sample-size window as a fraction of the normal seed.
    pub window_high: f64,
    /// Smallest sample size ever scanned.
    pub min_sample_size: u64,
    /// Hard cap on the sample size. Windows starting above it are rejected
    /// without scanning.
    pub max_sample_size: u64,
    /// Threshold range for upper-tailed tests: `[low * n * p0, high * n * p1]`.
    pub upper_range: RangeFactors,
    /// Threshold range for lower-tailed tests: `[low * n * p1, high * n * p0]`.
    pub lower_range: RangeFactors,
    /// Sample sizes scanned past the current best before stopping.
    pub patience: u64,
    /// Sample sizes scanned between progress reports and cancellation checks.
    pub progress_every: u64,
    pub threshold_scan: ThresholdScan,
    /// Score sample sizes of a chunk concurrently. Needs the `parallel`
    /// feature; ignored otherwise.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_low: 0.85,
            window_high: 1.15,
            min_sample_size: 10,
            max_sample_size: 2_000_000,
            upper_range: RangeFactors {
                low: 0.6,
                high: 1.8,
            },
            lower_range: RangeFactors {
                low: 0.2,
                high: 1.4,
            },
            patience: 5,
            progress_every: 16,
            threshold_scan: ThresholdScan::Bisect,
            parallel: false,
        }
    }
}

impl SearchConfig {
    pub fn range_factors(&self, case: TestCase) -> RangeFactors {
        match case {
            TestCase::UpperTailed => self.upper_range,
            TestCase::LowerTailed => self.lower_range,
        }
    }

    /// Reject configurations that cannot define a search window.
    pub fn validate(&self) -> Result<(), PlanError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PlanError::InvalidInput(format!(
                    "{name} must be a positive finite number, got {v}"
                )))
            }
        };
        positive("window_low", self.window_low)?;
        positive("window_high", self.window_high)?;
        if self.window_low > self.window_high {
            return Err(PlanError::InvalidInput(format!(
                "window_low ({}) exceeds window_high ({})",
                self.window_low, self.window_high
            )));
        }
        for (name, range) in [
            ("upper_range", self.upper_range),
            ("lower_range", self.lower_range),
        ] {
            positive(name, range.low)?;
            positive(name, range.high)?;
            if range.low > range.high {
                return Err(PlanError::InvalidInput(format!(
                    "{name}.low ({}) exceeds {name}.high ({})",
                    range.low, range.high
                )));
            }
        }
        if self.min_sample_size == 0 {
            return Err(PlanError::InvalidInput(
                "min_sample_size must be positive".into(),
            ));
        }
        if self.progress_every == 0 {
            return Err(PlanError::InvalidInput(
                "progress_every must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InverseConfig {
    pub primary_bracket: (f64, f64),
    /// Tried when the primary bracket shows no sign change.
    pub expanded_bracket: (f64, f64),
    pub root: RootOptions,
    /// Largest accepted `|F(r; n, p) - A|` at the returned root.
    pub max_residual: f64,
}

impl Default for InverseConfig {
    fn default() -> Self {
        Self {
            primary_bracket: (1e-4, 1.0 - 1e-4),
            expanded_bracket: (1e-6, 1.0 - 1e-6),
            root: RootOptions {
                xtol: 1e-10,
                ..RootOptions::default()
            },
            max_residual: 1e-6,
        }
    }
}
