//! # ivcrush
//!
//! Decision engine for selling earnings volatility crush.
//!
//! Turns already-fetched market observations (daily price bars and an option
//! chain snapshot) into a ranked trade recommendation for one underlying:
//! price history → realized volatility; option chain → implied-volatility
//! term structure and slope; both → IV/RV ratio → qualification → priority
//! score.
//!
//! ## Architecture
//!
//! - **`realized`** — Yang-Zhang, close-to-close and Parkinson estimators
//! - **`pricing`** — Black-Scholes price, Greeks, implied-vol back-solving
//! - **`term`** — ATM selection and the front/back term structure slope
//! - **`qualification`** — three-criterion `RECOMMENDED` / `CONSIDER` / `AVOID` rule
//! - **`scoring`** — weighted 0–100 priority score and ranking
//! - **`calendar`** — call calendar pricing and strike selection
//! - **`engine`** — snapshot in, [`TradeRecommendation`] out
//!
//! ## Design
//!
//! - **Pure.** No network, disk or clock access. The evaluation date and
//!   every threshold are explicit inputs ([`MarketSnapshot`],
//!   [`EvaluationConfig`]), so results are reproducible.
//! - **No panics.** Every fallible operation returns [`Result`]. A missing
//!   factor is never replaced by a neutral guess; it fails the criterion or
//!   leaves the candidate unscored.
//! - **Thread-safe.** No shared mutable state. Enable the `parallel` feature
//!   to evaluate batches on rayon; enable `logging` for `tracing` events.
//!
//! ## Example
//!
//! ```
//! use ivcrush::qualification::{qualify, QualificationThresholds, Recommendation};
//!
//! let result = qualify(-0.1, Some(2_000_000.0), 1.5, &QualificationThresholds::default());
//! assert_eq!(result.recommendation, Recommendation::Recommended);
//! ```

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
mod optim;
pub mod pricing;
pub mod qualification;
pub mod realized;
pub mod scoring;
pub mod term;
pub mod types;
mod validate;

#[doc(inline)]
pub use config::EvaluationConfig;
#[doc(inline)]
pub use engine::{MarketSnapshot, TradeRecommendation, evaluate, evaluate_batch};
#[doc(inline)]
pub use error::{IvCrushError, Result};
#[doc(inline)]
pub use qualification::Recommendation;
#[doc(inline)]
pub use scoring::rank;
#[doc(inline)]
pub use types::{ExpirationSlice, OptionQuote, OptionType, PriceBar, Vol};
