//! Candidate generation: look mentions up in the index and keep plausible senses.
//!
//! For each sense of a label, in index order (highest prior first):
//!
//! ```text
//!   not an article page              → skip
//!   prior < min_sense_probability    → skip
//!   no title, or a list page         → skip
//!   any "disambiguation" category    → skip (untitled categories are ignored)
//!   otherwise                        → accept, until max_senses - 1 are accepted
//! ```

use entlink_core::{Candidate, Category, Mention};

use crate::config::EngineConfig;
use crate::kb::{KbSet, KnowledgeBase, PageType, Sense};
use crate::map::{CandidateMap, Hypotheses};
use crate::Result;

/// Title prefixes of list pages.
const LIST_PREFIXES: [&str; 2] = ["List of", "Liste des"];

/// Category marker that disqualifies a sense.
const DISAMBIGUATION_MARKER: &str = "disambiguation";

/// Limits applied while generating candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationLimits {
    /// At most `max_senses - 1` senses are accepted per mention.
    pub max_senses: usize,
    /// Longer surface strings are not looked up.
    pub max_label_length: usize,
    /// Senses below this prior are skipped.
    pub min_sense_probability: f64,
}

impl GenerationLimits {
    /// Limits for `lang` from the engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig, lang: &str) -> Self {
        Self {
            max_senses: config.max_senses,
            max_label_length: config.max_label_length,
            min_sense_probability: config.language(lang).min_sense_probability,
        }
    }

    fn accept_cap(&self) -> usize {
        self.max_senses.saturating_sub(1)
    }
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default(), "en")
    }
}

/// Turns mentions into a [`CandidateMap`] against one language's index.
pub struct CandidateGenerator<'a> {
    kb: &'a dyn KnowledgeBase,
    limits: GenerationLimits,
}

impl<'a> CandidateGenerator<'a> {
    /// Generator over an index.
    #[must_use]
    pub fn new(kb: &'a dyn KnowledgeBase, limits: GenerationLimits) -> Self {
        Self { kb, limits }
    }

    /// Generator for `lang`; fails if no index is loaded for it.
    pub fn for_language(kbs: &'a KbSet, lang: &str, config: &EngineConfig) -> Result<Self> {
        let kb = kbs.get(lang)?;
        Ok(Self::new(kb.as_ref(), GenerationLimits::from_config(config, lang)))
    }

    /// Build the candidate map.
    ///
    /// Pinned user mentions pass through without lookup. Mentions with no
    /// accepted sense are kept as `TypedOnly` when typed and dropped otherwise.
    #[must_use]
    pub fn generate(&self, mentions: Vec<Mention>) -> CandidateMap {
        let mut map = CandidateMap::new();
        let total = mentions.len();
        for mut mention in mentions {
            if mention.is_pinned() {
                map.insert(mention, Hypotheses::Pinned);
                continue;
            }
            let candidates = match self.lookup(&mention.raw_text) {
                Some((link_probability, candidates)) => {
                    mention.link_probability = link_probability;
                    candidates
                }
                None => Vec::new(),
            };
            if let Some(h) = Hypotheses::from_candidates(candidates, mention.is_typed()) {
                map.insert(mention, h);
            }
        }
        log::debug!(
            "generated {} candidates for {}/{} mentions",
            map.candidate_count(),
            map.len(),
            total
        );
        map
    }

    /// Look up a surface string. `None` when the label is unknown, has no
    /// senses, or is too long to look up.
    #[must_use]
    pub fn lookup(&self, surface: &str) -> Option<(f64, Vec<Candidate>)> {
        if surface.chars().count() > self.limits.max_label_length {
            return None;
        }
        let label = self.kb.label(surface)?;
        if label.senses.is_empty() {
            return None;
        }
        let cap = self.limits.accept_cap();
        let candidates = label
            .senses
            .into_iter()
            .filter_map(|sense| accept_sense(sense, self.limits.min_sense_probability))
            .take(cap)
            .collect();
        Some((label.link_probability, candidates))
    }
}

/// Apply the sense filters; `Some` when the sense becomes a candidate.
fn accept_sense(sense: Sense, min_prior: f64) -> Option<Candidate> {
    if sense.page_type != PageType::Article || sense.prior_probability < min_prior {
        return None;
    }
    let title = sense.title?;
    if LIST_PREFIXES.iter().any(|p| title.starts_with(p)) {
        return None;
    }

    let mut categories: Vec<Category> = Vec::with_capacity(sense.parent_categories.len());
    for category in sense.parent_categories {
        let Some(category_title) = category.title.as_deref() else {
            log::warn!(
                "sense {} ('{}'): parent category {} has no title, skipping it",
                sense.id,
                title,
                category.id
            );
            continue;
        };
        if category_title
            .to_lowercase()
            .contains(DISAMBIGUATION_MARKER)
        {
            return None;
        }
        categories.push(category);
    }

    Some(
        Candidate::new(sense.id, title, sense.prior_probability)
            .with_categories(categories)
            .with_translations(sense.translations),
    )
}
