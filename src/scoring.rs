//! Priority scoring for ranking qualified candidates.
//!
//! Four raw factors are each mapped onto `[0, 100]` by a capped, monotonic
//! [`FactorScale`], then blended:
//!
//! ```text
//! total = 0.4·ivRv + 0.3·slope + 0.2·liquidity + 0.1·marketCap   ∈ [0, 100]
//! ```
//!
//! Only `CONSIDER` and `RECOMMENDED` candidates are scored; [`rank`] never
//! orders an `AVOID`.

use serde::{Deserialize, Serialize};

use crate::engine::TradeRecommendation;
use crate::error::{self, IvCrushError};
use crate::validate::{validate_finite, validate_non_negative};

/// Tolerance on the weight sum.
const WEIGHT_SUM_TOL: f64 = 1e-9;
/// Options volume (contracts) above which the liquidity bonus applies.
const OPTIONS_BONUS_MIN_VOLUME: f64 = 10_000.0;
/// Maximum liquidity bonus from options activity.
const OPTIONS_BONUS_CAP: f64 = 10.0;

/// Axis on which a [`FactorScale`] interpolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleAxis {
    #[default]
    Linear,
    /// Interpolate in `log10(x)`; for quantities spanning orders of magnitude.
    Log10,
}

/// Capped linear map from a raw factor onto `[0, 100]`.
///
/// `floor` maps to 0, `ceiling` maps to 100, values outside are clamped.
///
/// # Examples
/// ```
/// use ivcrush::scoring::FactorScale;
///
/// let iv_rv = FactorScale::linear(1.0, 2.0);
/// assert_eq!(iv_rv.normalize(2.0), 100.0);
/// assert_eq!(iv_rv.normalize(1.5), 50.0);
/// assert_eq!(iv_rv.normalize(0.7), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScale {
    pub floor: f64,
    pub ceiling: f64,
    #[serde(default)]
    pub axis: ScaleAxis,
}

impl FactorScale {
    pub fn linear(floor: f64, ceiling: f64) -> Self {
        Self {
            floor,
            ceiling,
            axis: ScaleAxis::Linear,
        }
    }

    pub fn log10(floor: f64, ceiling: f64) -> Self {
        Self {
            floor,
            ceiling,
            axis: ScaleAxis::Log10,
        }
    }

    /// Map `x` onto `[0, 100]`. Non-finite inputs, and non-positive inputs
    /// on a log axis, score 0.
    pub fn normalize(&self, x: f64) -> f64 {
        let (x, lo, hi) = match self.axis {
            ScaleAxis::Linear => (x, self.floor, self.ceiling),
            ScaleAxis::Log10 => {
                if x <= 0.0 {
                    return 0.0;
                }
                (x.log10(), self.floor.log10(), self.ceiling.log10())
            }
        };
        if !x.is_finite() {
            return 0.0;
        }
        (100.0 * (x - lo) / (hi - lo)).clamp(0.0, 100.0)
    }

    fn validate(&self, name: &str) -> error::Result<()> {
        validate_finite(self.floor, name)?;
        validate_finite(self.ceiling, name)?;
        if self.ceiling <= self.floor {
            return Err(IvCrushError::invalid_input(format!(
                "{name} scale ceiling {} must exceed floor {}",
                self.ceiling, self.floor
            )));
        }
        if self.axis == ScaleAxis::Log10 && self.floor <= 0.0 {
            return Err(IvCrushError::invalid_input(format!(
                "{name} log scale needs a positive floor, got {}",
                self.floor
            )));
        }
        Ok(())
    }
}

/// Blend weights; must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub iv_rv: f64,
    pub slope: f64,
    pub liquidity: f64,
    pub market_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            iv_rv: 0.4,
            slope: 0.3,
            liquidity: 0.2,
            market_cap: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.iv_rv + self.slope + self.liquidity + self.market_cap
    }

    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`] for negative weights or a sum
    /// other than 1.
    pub fn validate(&self) -> error::Result<()> {
        validate_non_negative(self.iv_rv, "iv_rv weight")?;
        validate_non_negative(self.slope, "slope weight")?;
        validate_non_negative(self.liquidity, "liquidity weight")?;
        validate_non_negative(self.market_cap, "market_cap weight")?;
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(IvCrushError::invalid_input(format!(
                "scoring weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Weights and per-factor reference scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// IV/RV ratio: 1.0 (fairly priced) → 0, 2.0 → 100.
    pub iv_rv: FactorScale,
    /// Backwardation magnitude in IV per day: 0 → 0, 0.01 → 100.
    pub slope: FactorScale,
    /// 30-day average share volume, log scale: 1M → 0, 100M → 100.
    pub liquidity: FactorScale,
    /// Market capitalization in dollars, log scale: $1B → 0, $1T → 100.
    pub market_cap: FactorScale,
    /// Add up to 10 liquidity points for active option chains.
    pub options_volume_bonus: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            iv_rv: FactorScale::linear(1.0, 2.0),
            slope: FactorScale::linear(0.0, 0.01),
            liquidity: FactorScale::log10(1e6, 1e8),
            market_cap: FactorScale::log10(1e9, 1e12),
            options_volume_bonus: true,
        }
    }
}

impl ScoringConfig {
    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`] for invalid weights or scales.
    pub fn validate(&self) -> error::Result<()> {
        self.weights.validate()?;
        self.iv_rv.validate("iv_rv")?;
        self.slope.validate("slope")?;
        self.liquidity.validate("liquidity")?;
        self.market_cap.validate("market_cap")?;
        Ok(())
    }
}

/// Raw inputs to the scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFactors {
    pub iv_rv_ratio: f64,
    /// Term-structure slope; only negative values earn points.
    pub slope: f64,
    pub avg_volume_30d: f64,
    pub market_cap: f64,
    /// Total option contracts traded, if known.
    pub options_volume: Option<f64>,
}

/// Sub-scores on `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub iv_rv: f64,
    pub slope: f64,
    pub liquidity: f64,
    pub market_cap: f64,
}

/// Composite score with its breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Weighted total in `[0, 100]`, rounded to 2 decimals.
    pub total: f64,
    pub components: ScoreComponents,
}

/// Weighted composite scorer.
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    config: ScoringConfig,
}

impl PriorityScorer {
    /// # Errors
    /// Returns [`IvCrushError::InvalidInput`] if the configuration is invalid.
    pub fn new(config: ScoringConfig) -> error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Normalize each factor and blend.
    pub fn score(&self, factors: &ScoreFactors) -> PriorityScore {
        let c = &self.config;

        let mut liquidity = c.liquidity.normalize(factors.avg_volume_30d);
        if c.options_volume_bonus
            && let Some(volume) = factors.options_volume
            && volume > OPTIONS_BONUS_MIN_VOLUME
        {
            liquidity = (liquidity + (volume / 1_000.0).log10().min(OPTIONS_BONUS_CAP)).min(100.0);
        }

        let components = ScoreComponents {
            iv_rv: round2(c.iv_rv.normalize(factors.iv_rv_ratio)),
            slope: round2(c.slope.normalize((-factors.slope).max(0.0))),
            liquidity: round2(liquidity),
            market_cap: round2(c.market_cap.normalize(factors.market_cap)),
        };

        PriorityScore {
            total: self.combine(&components),
            components,
        }
    }

    /// Weighted sum of sub-scores, clamped to `[0, 100]` and rounded to 2 decimals.
    ///
    /// Non-decreasing in every component.
    pub fn combine(&self, components: &ScoreComponents) -> f64 {
        let w = &self.config.weights;
        let total = w.iv_rv * components.iv_rv
            + w.slope * components.slope
            + w.liquidity * components.liquidity
            + w.market_cap * components.market_cap;
        if total.is_nan() {
            return 0.0;
        }
        round2(total.clamp(0.0, 100.0))
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Order candidates for capital allocation.
///
/// Drops `AVOID` and unscored candidates, then sorts by priority score
/// descending; ties break on symbol so the order is deterministic.
pub fn rank(candidates: Vec<TradeRecommendation>) -> Vec<TradeRecommendation> {
    let mut ranked: Vec<TradeRecommendation> = candidates
        .into_iter()
        .filter(|c| c.recommendation.is_actionable() && c.priority_score.is_some())
        .collect();
    ranked.sort_by(|a, b| {
        let (sa, sb) = (a.priority_score.unwrap_or(0.0), b.priority_score.unwrap_or(0.0));
        sb.total_cmp(&sa).then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked
}

/// Parse a display-formatted market cap such as `"$1.5B"`, `"$820M"` or
/// `"2,750,000,000"` into dollars.
///
/// # Errors
/// Returns [`IvCrushError::Data`] for empty, placeholder (`"-"`) or
/// unparseable strings, and for negative values.
pub fn parse_market_cap(text: &str) -> error::Result<f64> {
    let clean: String = text
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',') && !ch.is_whitespace())
        .collect();
    if clean.is_empty() || clean == "-" {
        return Err(IvCrushError::data(format!("market cap missing: {text:?}")));
    }

    let (digits, multiplier) = match clean.chars().last().map(|ch| ch.to_ascii_uppercase()) {
        Some('T') => (&clean[..clean.len() - 1], 1e12),
        Some('B') => (&clean[..clean.len() - 1], 1e9),
        Some('M') => (&clean[..clean.len() - 1], 1e6),
        Some('K') => (&clean[..clean.len() - 1], 1e3),
        _ => (clean.as_str(), 1.0),
    };
    let value: f64 = digits
        .parse()
        .map_err(|_| IvCrushError::data(format!("unparseable market cap: {text:?}")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(IvCrushError::data(format!("invalid market cap: {text:?}")));
    }
    Ok(value * multiplier)
}
