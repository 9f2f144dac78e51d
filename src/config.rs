//! Engine configuration.
//!
//! Global generation limits plus per-language thresholds, loaded from TOML:
//!
//! ```toml
//! max_senses = 5
//! max_context_size = 15
//!
//! [languages.en]
//! min_sense_probability = 0.01
//! min_selector_score = 0.5
//!
//! [languages.fr.ranker]
//! bias = -2.0
//! commonness = 3.0
//! ```
//!
//! Languages without a table use [`LanguageConfig::default`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::{RankerWeights, SelectorWeights};
use crate::{Error, Result};

static DEFAULT_LANGUAGE_CONFIG: Lazy<LanguageConfig> = Lazy::new(LanguageConfig::default);

/// Thresholds and model weights for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Mentions less likely than this to be links do not anchor the context.
    pub min_link_probability: f64,
    /// Senses with a lower prior are not generated.
    pub min_sense_probability: f64,
    /// Stage A cutoff on the selector score.
    pub min_selector_score: f64,
    /// Term-vector cutoff on the rank score.
    pub min_ranker_score: f64,
    /// Words with a higher Zipf frequency are ignored when building a
    /// context from free text.
    pub max_term_frequency: f64,
    /// Ranker weights.
    pub ranker: RankerWeights,
    /// Selector weights.
    pub selector: SelectorWeights,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            min_link_probability: 0.005,
            min_sense_probability: 0.01,
            min_selector_score: 0.5,
            min_ranker_score: 0.1,
            max_term_frequency: 4.0,
            ranker: RankerWeights::default(),
            selector: SelectorWeights::default(),
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Senses per mention are capped at `max_senses - 1`.
    pub max_senses: usize,
    /// Most local context windows per term, and most anchors per context.
    pub max_context_size: usize,
    /// Longer surface strings are not looked up.
    pub max_label_length: usize,
    /// Stage B cutoff on the rank score.
    pub min_entity_score: f64,
    /// Per-language overrides, keyed by ISO 639-1 code.
    pub languages: BTreeMap<String, LanguageConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_senses: 5,
            max_context_size: 15,
            max_label_length: 50,
            min_entity_score: 0.15,
            languages: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Settings for `lang`, falling back to defaults.
    #[must_use]
    pub fn language(&self, lang: &str) -> &LanguageConfig {
        self.languages
            .get(lang)
            .unwrap_or(&DEFAULT_LANGUAGE_CONFIG)
    }

    /// Override settings for one language.
    #[must_use]
    pub fn with_language(mut self, lang: impl Into<String>, config: LanguageConfig) -> Self {
        self.languages.insert(lang.into(), config);
        self
    }

    /// Set the sense cap.
    #[must_use]
    pub fn with_max_senses(mut self, max_senses: usize) -> Self {
        self.max_senses = max_senses;
        self
    }

    /// Set the Stage B threshold.
    #[must_use]
    pub fn with_min_entity_score(mut self, score: f64) -> Self {
        self.min_entity_score = score;
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_senses < 2 {
            return Err(Error::config(format!(
                "max_senses must be at least 2, got {}",
                self.max_senses
            )));
        }
        if self.max_context_size == 0 {
            return Err(Error::config("max_context_size must be positive"));
        }
        check_unit("min_entity_score", self.min_entity_score)?;
        for (lang, cfg) in &self.languages {
            let fields = [
                ("min_link_probability", cfg.min_link_probability),
                ("min_sense_probability", cfg.min_sense_probability),
                ("min_selector_score", cfg.min_selector_score),
                ("min_ranker_score", cfg.min_ranker_score),
            ];
            for (name, value) in fields {
                check_unit(&format!("languages.{lang}.{name}"), value)?;
            }
            if !cfg.max_term_frequency.is_finite() || cfg.max_term_frequency < 0.0 {
                return Err(Error::config(format!(
                    "languages.{lang}.max_term_frequency must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be in [0, 1], got {value}")))
    }
}
