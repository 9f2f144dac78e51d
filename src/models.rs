//! Ranker and selector contracts, plus fixed-weight logistic scorers.
//!
//! ```text
//!   Ranker:   (commonness, relatedness, context quality) ──► rank score
//!   Selector: (rank score, link probability, prior)      ──► selection score
//! ```
//!
//! Trained models live outside this crate and plug in through
//! [`ModelFactory`]. The logistic scorers here are a usable default with
//! hand-set weights; they are not calibrated.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::{Error, Result};

/// Scores how well a candidate fits its mention.
pub trait Ranker: Send + Sync {
    /// Probability-like score in [0, 1].
    fn score(&self, commonness: f64, relatedness: f64, quality: f64) -> Result<f64>;
}

/// Scores whether a ranked candidate should be kept at all.
pub trait Selector: Send + Sync {
    /// Probability-like score in [0, 1].
    fn score(&self, rank_score: f64, link_probability: f64, prior: f64) -> Result<f64>;
}

/// Builds per-language scorers. Called at most once per language and kind
/// by [`ModelRegistry`](crate::registry::ModelRegistry).
pub trait ModelFactory: Send + Sync {
    /// Build the ranker for `lang`.
    fn build_ranker(&self, lang: &str) -> Result<Arc<dyn Ranker>>;

    /// Build the selector for `lang`.
    fn build_selector(&self, lang: &str) -> Result<Arc<dyn Selector>>;
}

/// Weights of [`LogisticRanker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerWeights {
    /// Intercept
    pub bias: f64,
    /// Weight of the prior probability
    pub commonness: f64,
    /// Weight of the context relatedness
    pub relatedness: f64,
    /// Weight of the context quality
    pub quality: f64,
}

impl Default for RankerWeights {
    fn default() -> Self {
        Self {
            bias: -2.0,
            commonness: 3.0,
            relatedness: 4.0,
            quality: 0.5,
        }
    }
}

/// Weights of [`LogisticSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorWeights {
    /// Intercept
    pub bias: f64,
    /// Weight of the rank score
    pub rank: f64,
    /// Weight of the mention's link probability
    pub link_probability: f64,
    /// Weight of the prior probability
    pub prior: f64,
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            bias: -1.5,
            rank: 4.0,
            link_probability: 1.0,
            prior: 1.0,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn check_features(features: &[(&str, f64)]) -> Result<()> {
    for (name, value) in features {
        if !value.is_finite() {
            return Err(Error::scoring(format!("feature '{name}' is {value}")));
        }
    }
    Ok(())
}

/// `sigmoid(bias + w·features)` ranker.
#[derive(Debug, Clone, Default)]
pub struct LogisticRanker {
    weights: RankerWeights,
}

impl LogisticRanker {
    /// Ranker with the given weights.
    #[must_use]
    pub fn new(weights: RankerWeights) -> Self {
        Self { weights }
    }
}

impl Ranker for LogisticRanker {
    fn score(&self, commonness: f64, relatedness: f64, quality: f64) -> Result<f64> {
        check_features(&[
            ("commonness", commonness),
            ("relatedness", relatedness),
            ("quality", quality),
        ])?;
        let w = &self.weights;
        Ok(sigmoid(
            w.bias + w.commonness * commonness + w.relatedness * relatedness + w.quality * quality,
        ))
    }
}

/// `sigmoid(bias + w·features)` selector.
#[derive(Debug, Clone, Default)]
pub struct LogisticSelector {
    weights: SelectorWeights,
}

impl LogisticSelector {
    /// Selector with the given weights.
    #[must_use]
    pub fn new(weights: SelectorWeights) -> Self {
        Self { weights }
    }
}

impl Selector for LogisticSelector {
    fn score(&self, rank_score: f64, link_probability: f64, prior: f64) -> Result<f64> {
        check_features(&[
            ("rank_score", rank_score),
            ("link_probability", link_probability),
            ("prior", prior),
        ])?;
        let w = &self.weights;
        Ok(sigmoid(
            w.bias + w.rank * rank_score + w.link_probability * link_probability + w.prior * prior,
        ))
    }
}

/// Factory producing logistic scorers with per-language weights from the
/// engine configuration.
#[derive(Debug, Clone, Default)]
pub struct LogisticModels {
    config: EngineConfig,
}

impl LogisticModels {
    /// Factory reading weights from `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ModelFactory for LogisticModels {
    fn build_ranker(&self, lang: &str) -> Result<Arc<dyn Ranker>> {
        Ok(Arc::new(LogisticRanker::new(
            self.config.language(lang).ranker,
        )))
    }

    fn build_selector(&self, lang: &str) -> Result<Arc<dyn Selector>> {
        Ok(Arc::new(LogisticSelector::new(
            self.config.language(lang).selector,
        )))
    }
}
