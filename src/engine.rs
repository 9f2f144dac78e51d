//! The disambiguation engine.
//!
//! ```text
//!   (text, mentions, lang)
//!        │
//!        ▼
//!   CandidateGenerator ──► rank ──► prune_with_selector ──► prune_by_score
//!                                                               │
//!        ┌──────────────────────────────────────────────────────┘
//!        ▼
//!   flatten + sort ──► resolve_overlaps (single-best) ──► Enricher ──► Vec<LinkedEntity>
//! ```
//!
//! Only a missing knowledge base and malformed mentions fail a request.
//! Everything else degrades per candidate.
//!
//! # Example
//!
//! ```rust
//! use entlink::prelude::*;
//!
//! let kb = InMemoryKb::new("en").with_label(
//!     "Paris",
//!     0.4,
//!     vec![Sense::article(22989u64, "Paris", 0.7)],
//! );
//! let engine = Disambiguator::new(KbSet::new().with(kb), EngineConfig::default());
//!
//! let request = DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)])
//!     .with_text("Paris in spring")
//!     .with_language("en");
//! let entities = engine.disambiguate(&request)?;
//! assert_eq!(entities[0].resolved_id, Some(KbId(22989)));
//! # Ok::<(), entlink::Error>(())
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use entlink_core::{Candidate, LinkedEntity, Mention};

use crate::candidates::CandidateGenerator;
use crate::config::EngineConfig;
use crate::enrich::Enricher;
use crate::kb::KbSet;
use crate::lang::resolve_language;
use crate::map::{CandidateMap, Hypotheses};
use crate::models::{LogisticModels, ModelFactory};
use crate::overlap::resolve_overlaps;
use crate::pruning::{prune_by_score, prune_with_selector, PruneMode};
use crate::ranking::{rank, rank_with_local_contexts};
use crate::registry::ModelRegistry;
use crate::relatedness::{CategoryRelatedness, RelatednessContext};
use crate::Result;

/// Input of [`Disambiguator::disambiguate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationRequest {
    /// Source text; used for language detection when no language is given
    #[serde(default)]
    pub text: Option<String>,
    /// Detected mentions
    #[serde(default)]
    pub mentions: Vec<Mention>,
    /// ISO 639-1 code
    #[serde(default)]
    pub language: Option<String>,
    /// Relaxed thresholds, soft overlap demotion
    #[serde(default)]
    pub short_text: bool,
    /// Keep several candidates per mention
    #[serde(default)]
    pub nbest: bool,
    /// Languages whose titles are attached to outputs
    #[serde(default)]
    pub target_languages: Vec<String>,
}

impl DisambiguationRequest {
    /// Request over `mentions`.
    #[must_use]
    pub fn new(mentions: Vec<Mention>) -> Self {
        Self {
            mentions,
            ..Self::default()
        }
    }

    /// Set the source text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the language.
    #[must_use]
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.language = Some(lang.into());
        self
    }

    /// Enable short-text mode.
    #[must_use]
    pub fn short_text(mut self, short_text: bool) -> Self {
        self.short_text = short_text;
        self
    }

    /// Enable n-best mode.
    #[must_use]
    pub fn nbest(mut self, nbest: bool) -> Self {
        self.nbest = nbest;
        self
    }

    /// Attach titles in these languages.
    #[must_use]
    pub fn with_target_languages(mut self, langs: &[&str]) -> Self {
        self.target_languages = langs.iter().map(|l| l.to_string()).collect();
        self
    }
}

/// A weighted term of a term vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    /// Term text
    pub term: String,
    /// Term weight, carried to the output
    #[serde(default)]
    pub score: f64,
    /// Entities supplied by the caller; the term is then not disambiguated
    #[serde(default)]
    pub entities: Vec<Mention>,
}

impl WeightedTerm {
    /// Term without entities.
    #[must_use]
    pub fn new(term: impl Into<String>, score: f64) -> Self {
        Self {
            term: term.into(),
            score,
            entities: Vec::new(),
        }
    }
}

/// Input of [`Disambiguator::disambiguate_terms`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermRequest {
    /// Weighted terms
    pub terms: Vec<WeightedTerm>,
    /// Text the terms were extracted from; supplies local contexts
    #[serde(default)]
    pub text: Option<String>,
    /// ISO 639-1 code
    #[serde(default)]
    pub language: Option<String>,
    /// Keep every surviving candidate per term
    #[serde(default)]
    pub nbest: bool,
    /// Languages whose titles are attached to outputs
    #[serde(default)]
    pub target_languages: Vec<String>,
}

/// Disambiguated term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermResult {
    /// Term text
    pub term: String,
    /// Term weight
    pub score: f64,
    /// Resolutions, best first
    pub entities: Vec<LinkedEntity>,
}

/// Entity disambiguation over a set of per-language knowledge bases.
///
/// Cheap to share: wrap in an `Arc` and call from any thread.
pub struct Disambiguator {
    kbs: KbSet,
    config: EngineConfig,
    registry: ModelRegistry,
    relatedness: Arc<dyn RelatednessContext>,
}

/// Builder for [`Disambiguator`].
pub struct DisambiguatorBuilder {
    kbs: KbSet,
    config: EngineConfig,
    models: Option<Arc<dyn ModelFactory>>,
    relatedness: Option<Arc<dyn RelatednessContext>>,
}

impl DisambiguatorBuilder {
    /// Use this configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build rankers and selectors through `factory`.
    #[must_use]
    pub fn models(mut self, factory: Arc<dyn ModelFactory>) -> Self {
        self.models = Some(factory);
        self
    }

    /// Measure relatedness with `relatedness`.
    #[must_use]
    pub fn relatedness(mut self, relatedness: Arc<dyn RelatednessContext>) -> Self {
        self.relatedness = Some(relatedness);
        self
    }

    /// Validate the configuration and build.
    pub fn build(self) -> Result<Disambiguator> {
        self.config.validate()?;
        let models = self
            .models
            .unwrap_or_else(|| Arc::new(LogisticModels::new(self.config.clone())));
        let relatedness = self.relatedness.unwrap_or_else(|| {
            Arc::new(CategoryRelatedness::new(
                self.kbs.clone(),
                self.config.clone(),
            ))
        });
        Ok(Disambiguator {
            kbs: self.kbs,
            config: self.config,
            registry: ModelRegistry::new(models),
            relatedness,
        })
    }
}

impl Disambiguator {
    /// Engine with logistic scorers and category relatedness.
    ///
    /// The configuration is not validated; use [`Disambiguator::builder`]
    /// for untrusted configuration.
    #[must_use]
    pub fn new(kbs: KbSet, config: EngineConfig) -> Self {
        let models: Arc<dyn ModelFactory> = Arc::new(LogisticModels::new(config.clone()));
        let relatedness: Arc<dyn RelatednessContext> =
            Arc::new(CategoryRelatedness::new(kbs.clone(), config.clone()));
        Self {
            kbs,
            config,
            registry: ModelRegistry::new(models),
            relatedness,
        }
    }

    /// Builder over `kbs`.
    #[must_use]
    pub fn builder(kbs: KbSet) -> DisambiguatorBuilder {
        DisambiguatorBuilder {
            kbs,
            config: EngineConfig::default(),
            models: None,
            relatedness: None,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loaded knowledge bases.
    #[must_use]
    pub fn kbs(&self) -> &KbSet {
        &self.kbs
    }

    /// Scorer registry.
    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Disambiguate the mentions of one request.
    pub fn disambiguate(&self, request: &DisambiguationRequest) -> Result<Vec<LinkedEntity>> {
        let lang = resolve_language(request.language.as_deref(), request.text.as_deref());
        let generator = CandidateGenerator::for_language(&self.kbs, &lang, &self.config)?;
        let mentions = indexed(&request.mentions)?;
        let mode = PruneMode::from_nbest(request.nbest);

        let map = generator.generate(mentions);
        let map = rank(map, self.relatedness.as_ref(), &self.registry, &lang);
        let map = self.select(map, &lang);
        let map = prune_by_score(
            map,
            mode,
            request.short_text,
            self.config.min_entity_score,
        );

        let mut entities = flatten(map);
        entities.sort_by_key(LinkedEntity::position_key);
        if mode == PruneMode::SingleBest {
            entities = resolve_overlaps(entities, request.short_text);
        }

        let entities =
            Enricher::new(&self.kbs, &lang, &request.target_languages).enrich(entities);
        log::debug!(
            "disambiguated {} mentions into {} entities ({lang})",
            request.mentions.len(),
            entities.len()
        );
        Ok(entities)
    }

    /// Disambiguate a weighted term vector, using windows of the source
    /// text around each term as additional contexts.
    ///
    /// Results follow the term order. Terms supplied with entities are
    /// returned as given and seed the context.
    pub fn disambiguate_terms(&self, request: &TermRequest) -> Result<Vec<TermResult>> {
        let lang = resolve_language(request.language.as_deref(), request.text.as_deref());
        let generator = CandidateGenerator::for_language(&self.kbs, &lang, &self.config)?;
        let text = request.text.as_deref().map(|t| t.trim().to_lowercase());
        let threshold = self.config.language(&lang).min_ranker_score;

        let mut mentions = Vec::new();
        for (i, term) in request.terms.iter().enumerate() {
            if term.entities.is_empty() {
                if !term.term.trim().is_empty() {
                    let mut mention = Mention::new(term.term.trim(), i, i + 1);
                    mention.index = i;
                    mentions.push(mention);
                }
                continue;
            }
            for entity in term.entities.iter().filter(|e| e.is_pinned()) {
                let mut seed = entity.clone();
                seed.start = i;
                seed.end = i + 1;
                seed.index = i;
                mentions.push(seed);
            }
        }

        let map = generator.generate(mentions);
        let map = rank_with_local_contexts(
            map,
            text.as_deref(),
            self.relatedness.as_ref(),
            &self.registry,
            &lang,
            self.config.max_context_size,
        );

        let enricher = Enricher::new(&self.kbs, &lang, &request.target_languages);
        let results = request
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| {
                let entities = if term.entities.is_empty() {
                    let linked: Vec<LinkedEntity> = map
                        .by_index(i)
                        .map(|entry| {
                            above_floor(entry.hypotheses.candidates(), threshold)
                                .take(if request.nbest { usize::MAX } else { 1 })
                                .map(|c| LinkedEntity::from_candidate(&entry.mention, c))
                                .collect()
                        })
                        .unwrap_or_default();
                    enricher.enrich(linked)
                } else {
                    term.entities.iter().map(LinkedEntity::from_mention).collect()
                };
                TermResult {
                    term: term.term.clone(),
                    score: term.score,
                    entities,
                }
            })
            .collect();
        Ok(results)
    }

    /// Disambiguate requests in parallel. Results follow request order;
    /// each request fails or succeeds on its own.
    #[must_use]
    pub fn disambiguate_batch(
        &self,
        requests: &[DisambiguationRequest],
    ) -> Vec<Result<Vec<LinkedEntity>>> {
        requests
            .par_iter()
            .map(|request| self.disambiguate(request))
            .collect()
    }

    fn select(&self, map: CandidateMap, lang: &str) -> CandidateMap {
        match self.registry.selector(lang) {
            Ok(selector) => prune_with_selector(
                map,
                selector.as_ref(),
                self.config.language(lang).min_selector_score,
            ),
            Err(e) => {
                log::warn!("no selector for '{lang}', skipping selector pruning: {e}");
                map
            }
        }
    }
}

impl std::fmt::Debug for Disambiguator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disambiguator")
            .field("kbs", &self.kbs)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Validate spans and assign insertion indices.
fn indexed(mentions: &[Mention]) -> Result<Vec<Mention>> {
    mentions
        .iter()
        .enumerate()
        .map(|(i, m)| -> Result<Mention> {
            m.validate()?;
            let mut m = m.clone();
            m.index = i;
            Ok(m)
        })
        .collect()
}

/// Ranked term candidates scoring strictly above `floor`, best first.
/// Unlike [`prune_by_score`], n-best keeps every one of them.
fn above_floor(candidates: &[Candidate], floor: f64) -> impl Iterator<Item = &Candidate> {
    candidates.iter().filter(move |c| c.rank_score > floor)
}

/// One entity per pinned or typed-only mention, one per surviving candidate.
/// Unpinned user mentions are ranked like detected ones and land here as
/// candidates, not as the raw mention.
fn flatten(map: CandidateMap) -> Vec<LinkedEntity> {
    let mut entities = Vec::with_capacity(map.len());
    for entry in map {
        match &entry.hypotheses {
            Hypotheses::Pinned | Hypotheses::TypedOnly => {
                entities.push(LinkedEntity::from_mention(&entry.mention));
            }
            Hypotheses::Ranked(candidates) => entities.extend(
                candidates
                    .iter()
                    .map(|c| LinkedEntity::from_candidate(&entry.mention, c)),
            ),
        }
    }
    entities
}
