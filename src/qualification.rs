//! Trade qualification: a pure three-criterion classifier.
//!
//! A candidate passes up to three independent checks:
//!
//! | criterion | passes when |
//! |---|---|
//! | liquidity | `avg_volume_30d >= volume_min` |
//! | vol premium | `iv_rv_ratio >= iv_rv_min` |
//! | backwardation | `slope < slope_max` (strict) |
//!
//! The pass count alone decides the outcome: 3 → [`Recommendation::Recommended`],
//! 2 → [`Recommendation::Consider`], 0 or 1 → [`Recommendation::Avoid`].
//! NaN inputs and a missing volume fail their criterion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error;
use crate::validate::validate_finite;

/// Three-way trade recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    /// Fewer than two criteria pass.
    Avoid,
    /// Exactly two criteria pass.
    Consider,
    /// All three criteria pass.
    Recommended,
}

impl Recommendation {
    /// Outcome for a given number of passing criteria.
    pub fn from_pass_count(passed: usize) -> Self {
        match passed {
            0 | 1 => Self::Avoid,
            2 => Self::Consider,
            _ => Self::Recommended,
        }
    }

    /// Whether the candidate may be ranked at all.
    pub fn is_actionable(self) -> bool {
        self != Self::Avoid
    }

    /// Suggested allocation band for a calendar spread on this candidate.
    pub fn position_size(self) -> PositionSize {
        match self {
            Self::Recommended => PositionSize { min: 0.06, max: 0.08 },
            Self::Consider => PositionSize { min: 0.02, max: 0.03 },
            Self::Avoid => PositionSize { min: 0.0, max: 0.0 },
        }
    }
}

/// Fraction of portfolio capital to commit, as a `[min, max]` band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for PositionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max == 0.0 {
            return f.write_str("0%");
        }
        write!(f, "{:.0}-{:.0}%", self.min * 100.0, self.max * 100.0)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Avoid => "AVOID",
            Self::Consider => "CONSIDER",
            Self::Recommended => "RECOMMENDED",
        })
    }
}

/// Pass/fail thresholds for the three criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationThresholds {
    /// Minimum 30-day average share volume.
    pub volume_min: f64,
    /// Minimum front IV / realized vol ratio.
    pub iv_rv_min: f64,
    /// The term-structure slope must be strictly below this value.
    pub slope_max: f64,
}

impl Default for QualificationThresholds {
    fn default() -> Self {
        Self {
            volume_min: 1_000_000.0,
            iv_rv_min: 1.2,
            slope_max: 0.0,
        }
    }
}

impl QualificationThresholds {
    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`](crate::IvCrushError::InvalidInput)
    /// for non-finite thresholds.
    pub fn validate(&self) -> error::Result<()> {
        validate_finite(self.volume_min, "volume_min")?;
        validate_finite(self.iv_rv_min, "iv_rv_min")?;
        validate_finite(self.slope_max, "slope_max")?;
        Ok(())
    }
}

/// Per-criterion flags and the resulting recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationResult {
    pub volume_ok: bool,
    pub iv_rv_ok: bool,
    pub slope_ok: bool,
    pub recommendation: Recommendation,
}

impl QualificationResult {
    /// Number of criteria that passed.
    pub fn passed(&self) -> usize {
        [self.volume_ok, self.iv_rv_ok, self.slope_ok]
            .into_iter()
            .filter(|&ok| ok)
            .count()
    }
}

/// Classify a candidate.
///
/// Deterministic and side-effect free: identical inputs always yield the
/// identical result.
///
/// # Examples
/// ```
/// use ivcrush::qualification::{qualify, QualificationThresholds, Recommendation};
///
/// let t = QualificationThresholds::default();
/// let r = qualify(-0.1, Some(2_000_000.0), 1.5, &t);
/// assert_eq!(r.recommendation, Recommendation::Recommended);
///
/// let r = qualify(-0.1, Some(500_000.0), 1.5, &t);
/// assert_eq!(r.recommendation, Recommendation::Consider);
/// ```
pub fn qualify(
    slope: f64,
    avg_volume_30d: Option<f64>,
    iv_rv_ratio: f64,
    thresholds: &QualificationThresholds,
) -> QualificationResult {
    let volume_ok = avg_volume_30d.is_some_and(|v| v >= thresholds.volume_min);
    let iv_rv_ok = iv_rv_ratio >= thresholds.iv_rv_min;
    let slope_ok = slope < thresholds.slope_max;

    let passed = [volume_ok, iv_rv_ok, slope_ok].iter().filter(|&&ok| ok).count();
    let result = QualificationResult {
        volume_ok,
        iv_rv_ok,
        slope_ok,
        recommendation: Recommendation::from_pass_count(passed),
    };

    #[cfg(feature = "logging")]
    tracing::debug!(
        volume_ok,
        iv_rv_ok,
        slope_ok,
        recommendation = %result.recommendation,
        "candidate qualified"
    );

    result
}
