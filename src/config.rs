//! Evaluation configuration.
//!
//! One explicit value carries every threshold and convention an evaluation
//! depends on; nothing is read from process-wide state. All structs use
//! `#[serde(default)]`, so a partial document supplied by the caller (TOML,
//! JSON, ...) is completed from the defaults below. The library never reads
//! configuration files itself.
//!
//! ```
//! use ivcrush::config::EvaluationConfig;
//!
//! let config = EvaluationConfig::default();
//! assert_eq!(config.term_structure_cutoff_days, 45);
//! assert_eq!(config.thresholds.iv_rv_min, 1.2);
//! config.validate()?;
//! # Ok::<(), ivcrush::IvCrushError>(())
//! ```

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{self, IvCrushError};
use crate::realized::VolatilityMethod;
use crate::validate::{validate_finite, validate_positive};

pub use crate::qualification::QualificationThresholds;
pub use crate::scoring::{FactorScale, ScaleAxis, ScoringConfig, ScoringWeights};

/// Permitted realized-volatility lookback, in daily returns.
pub const LOOKBACK_RANGE: RangeInclusive<usize> = 20..=30;

/// Everything one evaluation needs besides market data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub thresholds: QualificationThresholds,
    /// Horizon in calendar days at which the back IV is read.
    pub term_structure_cutoff_days: u32,
    /// Daily returns in the realized-volatility window.
    pub volatility_lookback_days: usize,
    pub volatility_method: VolatilityMethod,
    /// Continuously compounded, used for back-solving IVs and model straddles.
    pub risk_free_rate: f64,
    pub trading_days_per_year: f64,
    /// Bars averaged when the snapshot carries no average volume.
    pub volume_window_days: usize,
    pub scoring: ScoringConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            thresholds: QualificationThresholds::default(),
            term_structure_cutoff_days: 45,
            volatility_lookback_days: 30,
            volatility_method: VolatilityMethod::YangZhang,
            risk_free_rate: 0.0,
            trading_days_per_year: 252.0,
            volume_window_days: 30,
            scoring: ScoringConfig::default(),
        }
    }
}

impl EvaluationConfig {
    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> error::Result<()> {
        self.thresholds.validate()?;
        if self.term_structure_cutoff_days == 0 {
            return Err(IvCrushError::invalid_input(
                "term_structure_cutoff_days must be positive",
            ));
        }
        if !LOOKBACK_RANGE.contains(&self.volatility_lookback_days) {
            return Err(IvCrushError::invalid_input(format!(
                "volatility_lookback_days must be in [{}, {}], got {}",
                LOOKBACK_RANGE.start(),
                LOOKBACK_RANGE.end(),
                self.volatility_lookback_days
            )));
        }
        validate_finite(self.risk_free_rate, "risk_free_rate")?;
        validate_positive(self.trading_days_per_year, "trading_days_per_year")?;
        if self.volume_window_days == 0 {
            return Err(IvCrushError::invalid_input(
                "volume_window_days must be positive",
            ));
        }
        self.scoring.validate()
    }
}
