//! Relatedness contexts.
//!
//! A [`Context`] is the set of senses the document is "about": pinned user
//! mentions plus the most common sense of each likely-link mention. A
//! candidate's relatedness is its weighted similarity to those anchors.
//!
//! ```text
//!   "Paris is the capital of France."
//!
//!   anchors: Paris (w=0.70, from mention 0)   France (w=0.90, from mention 1)
//!   quality: mean anchor weight = 0.80
//!
//!   relatedness(Paris ← mention 0) = sim(Paris, France)          (own anchor skipped)
//!   relatedness(Paris Hilton ← 0)  = sim(Paris Hilton, France)
//! ```
//!
//! The reference measure, [`CategoryRelatedness`], compares parent-category
//! titles and memoizes each unordered id pair in a [`RelatednessCache`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use entlink_core::{Candidate, KbId, Mention};

use crate::config::EngineConfig;
use crate::kb::{KbSet, KnowledgeBase, PageType};
use crate::map::{CandidateMap, Hypotheses};
use crate::similarity::{jaccard, title_set};
use crate::sync::{read, write, RwLock};
use crate::{Error, Result};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'’\-]*").unwrap());

/// A sense the context is anchored on.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Sense id
    pub id: KbId,
    /// Case-folded parent category titles
    pub categories: HashSet<String>,
    /// Contribution to relatedness and quality, in [0, 1]
    pub weight: f64,
    /// Index of the mention that produced the anchor; `None` for anchors
    /// found in free text
    pub source: Option<usize>,
}

/// Relatedness summary of a document or text window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    anchors: Vec<Anchor>,
    quality: f64,
}

impl Context {
    /// Context with no signal; every relatedness is 0 and quality is 0.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Context over `anchors` with the given quality, clamped to [0, 1].
    #[must_use]
    pub fn new(anchors: Vec<Anchor>, quality: f64) -> Self {
        let quality = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { anchors, quality }
    }

    /// How much disambiguating signal the context carries.
    #[must_use]
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Anchors, heaviest first.
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// No anchors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Builds contexts and measures candidate relatedness against them.
pub trait RelatednessContext: Send + Sync {
    /// Context from a candidate map and the pinned user mentions.
    fn build(&self, map: &CandidateMap, pinned: &[Mention], lang: &str) -> Result<Context>;

    /// Context from free text and the pinned user mentions.
    fn build_from_text(&self, text: &str, pinned: &[Mention], lang: &str) -> Result<Context>;

    /// Relatedness of `candidate`, proposed for `mention`, to `context`.
    fn relatedness_to(
        &self,
        mention: &Mention,
        candidate: &Candidate,
        context: &Context,
        lang: &str,
    ) -> Result<f64>;
}

/// Unordered pair of ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(KbId, KbId);

impl PairKey {
    /// Key for `{a, b}`; `PairKey::new(a, b) == PairKey::new(b, a)`.
    #[must_use]
    pub fn new(a: KbId, b: KbId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Counters of a [`RelatednessCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups
    pub requests: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Stored pairs
    pub entries: usize,
}

/// Concurrent memo of pairwise relatedness.
#[derive(Debug, Default)]
pub struct RelatednessCache {
    pairs: RwLock<HashMap<PairKey, f64>>,
    requests: AtomicU64,
    hits: AtomicU64,
}

impl RelatednessCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `{a, b}`, computing and storing it on a miss.
    ///
    /// Two threads missing on the same pair may both compute; the value is
    /// a pure function of the pair, so either write is correct.
    pub fn get_or_compute(&self, a: KbId, b: KbId, compute: impl FnOnce() -> f64) -> f64 {
        let key = PairKey::new(a, b);
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(&value) = read(&self.pairs).get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value;
        }
        let value = compute();
        write(&self.pairs).insert(key, value);
        value
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            entries: read(&self.pairs).len(),
        }
    }

    /// Drop all pairs and reset counters.
    pub fn clear(&self) {
        write(&self.pairs).clear();
        self.requests.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }
}

/// Thresholds used while anchoring a context.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AnchorLimits {
    min_link_probability: f64,
    max_term_frequency: f64,
    max_anchors: usize,
}

/// Category-overlap relatedness over a set of knowledge bases.
///
/// Pairwise relatedness is the Jaccard overlap of parent-category titles.
pub struct CategoryRelatedness {
    kbs: KbSet,
    config: EngineConfig,
    caches: HashMap<String, RelatednessCache>,
}

impl CategoryRelatedness {
    /// Measure over every language in `kbs`.
    #[must_use]
    pub fn new(kbs: KbSet, config: EngineConfig) -> Self {
        let caches = kbs
            .languages()
            .into_iter()
            .map(|lang| (lang.to_string(), RelatednessCache::new()))
            .collect();
        Self {
            kbs,
            config,
            caches,
        }
    }

    /// Cache counters for `lang`.
    #[must_use]
    pub fn cache_stats(&self, lang: &str) -> Option<CacheStats> {
        self.caches.get(lang).map(RelatednessCache::stats)
    }

    fn limits(&self, lang: &str) -> AnchorLimits {
        let lc = self.config.language(lang);
        AnchorLimits {
            min_link_probability: lc.min_link_probability,
            max_term_frequency: lc.max_term_frequency,
            max_anchors: self.config.max_context_size,
        }
    }

    fn pinned_anchors(kb: &dyn KnowledgeBase, pinned: &[Mention]) -> Vec<Anchor> {
        pinned
            .iter()
            .filter_map(|m| {
                let id = m.resolved_id?;
                let categories = kb.parent_categories(id);
                Some(Anchor {
                    id,
                    categories: title_set(categories.iter().filter_map(|c| c.title.as_deref())),
                    weight: 1.0,
                    source: Some(m.index),
                })
            })
            .collect()
    }

    /// Most common article sense of a free-text phrase.
    fn text_anchor(kb: &dyn KnowledgeBase, phrase: &str, limits: &AnchorLimits) -> Option<Anchor> {
        let label = kb.label(phrase)?;
        if label.link_probability < limits.min_link_probability {
            return None;
        }
        let sense = label
            .senses
            .into_iter()
            .find(|s| s.page_type == PageType::Article && s.title.is_some())?;
        Some(Anchor {
            id: sense.id,
            categories: title_set(
                sense
                    .parent_categories
                    .iter()
                    .filter_map(|c| c.title.as_deref()),
            ),
            weight: sense.prior_probability.clamp(0.0, 1.0),
            source: None,
        })
    }
}

/// Keep the heaviest anchor per id, sort by weight, truncate, and score
/// quality as the mean weight.
fn finish(mut anchors: Vec<Anchor>, max_anchors: usize) -> Context {
    anchors.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = HashSet::new();
    anchors.retain(|a| seen.insert(a.id));
    anchors.truncate(max_anchors);
    let quality = if anchors.is_empty() {
        0.0
    } else {
        anchors.iter().map(|a| a.weight).sum::<f64>() / anchors.len() as f64
    };
    Context::new(anchors, quality)
}

impl RelatednessContext for CategoryRelatedness {
    fn build(&self, map: &CandidateMap, pinned: &[Mention], lang: &str) -> Result<Context> {
        let kb = self.kbs.get(lang)?;
        let limits = self.limits(lang);
        let mut anchors = Self::pinned_anchors(kb.as_ref(), pinned);

        for entry in map {
            let Hypotheses::Ranked(candidates) = &entry.hypotheses else {
                continue;
            };
            if entry.mention.link_probability < limits.min_link_probability {
                continue;
            }
            let Some(best) = candidates.iter().max_by(|a, b| {
                a.prior_probability
                    .partial_cmp(&b.prior_probability)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }) else {
                continue;
            };
            anchors.push(Anchor {
                id: best.kb_id,
                categories: title_set(best.category_titles()),
                weight: best.prior_probability.clamp(0.0, 1.0),
                source: Some(entry.mention.index),
            });
        }

        let context = finish(anchors, limits.max_anchors);
        log::debug!(
            "context for '{lang}': {} anchors, quality {:.3}",
            context.anchors().len(),
            context.quality()
        );
        Ok(context)
    }

    fn build_from_text(&self, text: &str, pinned: &[Mention], lang: &str) -> Result<Context> {
        let kb = self.kbs.get(lang)?;
        let limits = self.limits(lang);
        let mut anchors = Self::pinned_anchors(kb.as_ref(), pinned);

        let words: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();
        for (i, word) in words.iter().enumerate() {
            let frequent = kb
                .zipf_frequency(word)
                .is_some_and(|z| z > limits.max_term_frequency);
            if !frequent {
                if let Some(anchor) = Self::text_anchor(kb.as_ref(), word, &limits) {
                    anchors.push(anchor);
                }
            }
            if let Some(next) = words.get(i + 1) {
                let bigram = format!("{word} {next}");
                if let Some(anchor) = Self::text_anchor(kb.as_ref(), &bigram, &limits) {
                    anchors.push(anchor);
                }
            }
        }

        Ok(finish(anchors, limits.max_anchors))
    }

    fn relatedness_to(
        &self,
        mention: &Mention,
        candidate: &Candidate,
        context: &Context,
        lang: &str,
    ) -> Result<f64> {
        let cache = self
            .caches
            .get(lang)
            .ok_or_else(|| Error::language_not_loaded(lang))?;

        let mut own: Option<HashSet<String>> = None;
        let mut weighted = 0.0;
        let mut total = 0.0;
        for anchor in context.anchors() {
            if anchor.source == Some(mention.index) {
                continue;
            }
            let sim = if anchor.id == candidate.kb_id {
                1.0
            } else {
                cache.get_or_compute(candidate.kb_id, anchor.id, || {
                    let own = own.get_or_insert_with(|| title_set(candidate.category_titles()));
                    jaccard(own, &anchor.categories)
                })
            };
            weighted += anchor.weight * sim;
            total += anchor.weight;
        }

        if total <= 0.0 {
            return Ok(0.0);
        }
        let value = weighted / total;
        if !value.is_finite() {
            return Err(Error::scoring(format!(
                "relatedness of {} is {value}",
                candidate.kb_id
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::{InMemoryKb, Sense};

    fn geography_kb() -> InMemoryKb {
        InMemoryKb::new("en")
            .with_label(
                "Paris",
                0.4,
                vec![
                    Sense::article(1u64, "Paris", 0.7)
                        .with_category(100u64, "Capitals in Europe")
                        .with_category(101u64, "France"),
                    Sense::article(2u64, "Paris Hilton", 0.05)
                        .with_category(200u64, "American socialites"),
                ],
            )
            .with_label(
                "France",
                0.6,
                vec![Sense::article(10u64, "France", 0.9)
                    .with_category(101u64, "France")
                    .with_category(102u64, "Countries in Europe")],
            )
            .with_label("the", 0.001, vec![Sense::article(99u64, "The", 0.5)])
            .with_frequency("the", 7.7)
    }

    fn measure() -> CategoryRelatedness {
        let kbs = KbSet::new().with(geography_kb());
        CategoryRelatedness::new(kbs, EngineConfig::default())
    }

    fn ranked_map() -> CandidateMap {
        let kb = geography_kb();
        let gen = crate::candidates::CandidateGenerator::new(
            &kb,
            crate::candidates::GenerationLimits::default(),
        );
        let mut paris = Mention::new("Paris", 0, 5);
        paris.index = 0;
        let mut france = Mention::new("France", 24, 30);
        france.index = 1;
        gen.generate(vec![paris, france])
    }

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(PairKey::new(KbId(3), KbId(1)), PairKey::new(KbId(1), KbId(3)));
    }

    #[test]
    fn context_from_map_uses_most_common_senses() {
        let ctx = measure().build(&ranked_map(), &[], "en").unwrap();
        let ids: Vec<_> = ctx.anchors().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![KbId(10), KbId(1)]);
        assert!((ctx.quality() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn own_anchor_is_skipped() {
        let rel = measure();
        let map = ranked_map();
        let ctx = rel.build(&map, &[], "en").unwrap();
        let paris = map.by_index(0).unwrap();
        let city = &paris.hypotheses.candidates()[0];
        let hilton = &paris.hypotheses.candidates()[1];
        let r_city = rel.relatedness_to(&paris.mention, city, &ctx, "en").unwrap();
        let r_hilton = rel.relatedness_to(&paris.mention, hilton, &ctx, "en").unwrap();
        // {capitals in europe, france} vs {france, countries in europe}
        assert!((r_city - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(r_hilton, 0.0);
    }

    #[test]
    fn cache_hits_on_repeat() {
        let rel = measure();
        let map = ranked_map();
        let ctx = rel.build(&map, &[], "en").unwrap();
        let paris = map.by_index(0).unwrap();
        let city = &paris.hypotheses.candidates()[0];
        rel.relatedness_to(&paris.mention, city, &ctx, "en").unwrap();
        rel.relatedness_to(&paris.mention, city, &ctx, "en").unwrap();
        let stats = rel.cache_stats("en").unwrap();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn pinned_mentions_anchor_with_full_weight() {
        let mut pinned = Mention::new("France", 0, 6).pinned_to(KbId(10));
        pinned.index = 7;
        let ctx = measure()
            .build(&CandidateMap::new(), &[pinned], "en")
            .unwrap();
        assert_eq!(ctx.anchors().len(), 1);
        assert_eq!(ctx.anchors()[0].source, Some(7));
        assert!((ctx.quality() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn text_context_skips_frequent_and_unlinked_words() {
        let ctx = measure()
            .build_from_text("the trip from Paris to France", &[], "en")
            .unwrap();
        let ids: HashSet<_> = ctx.anchors().iter().map(|a| a.id).collect();
        assert!(ids.contains(&KbId(1)));
        assert!(ids.contains(&KbId(10)));
        assert!(!ids.contains(&KbId(99)));
    }

    #[test]
    fn empty_context_relatedness_is_zero() {
        let rel = measure();
        let m = Mention::new("Paris", 0, 5);
        let c = Candidate::new(1u64, "Paris", 0.7);
        assert_eq!(rel.relatedness_to(&m, &c, &Context::empty(), "en").unwrap(), 0.0);
    }

    #[test]
    fn unknown_language_fails() {
        assert!(matches!(
            measure().build(&CandidateMap::new(), &[], "xx"),
            Err(Error::LanguageNotLoaded(_))
        ));
    }
}
