//! Ranking: score every candidate against the context and sort.
//!
//! ```text
//!   rank_score = Ranker(prior, relatedness(candidate, ctx), ctx.quality)
//! ```
//!
//! With local contexts the score is the mean over the document context and
//! each local window's context. One failing candidate scores 0; its
//! siblings are unaffected.

use std::sync::Arc;

use entlink_core::{Candidate, Mention, Origin};

use crate::context::local_windows;
use crate::map::{CandidateMap, Entry, Hypotheses};
use crate::models::Ranker;
use crate::registry::ModelRegistry;
use crate::relatedness::{Context, RelatednessContext};
use crate::Result;

/// Stable sort by rank score, best first.
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.rank_score
            .partial_cmp(&a.rank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// User mentions of the map; they seed the context.
#[must_use]
pub fn user_mentions(map: &CandidateMap) -> Vec<Mention> {
    map.mentions()
        .filter(|m| m.origin == Origin::User)
        .cloned()
        .collect()
}

/// Document context, or an empty one if building fails.
#[must_use]
pub fn document_context(
    relatedness: &dyn RelatednessContext,
    map: &CandidateMap,
    pinned: &[Mention],
    lang: &str,
) -> Context {
    relatedness.build(map, pinned, lang).unwrap_or_else(|e| {
        log::warn!("context build failed for '{lang}', ranking without context: {e}");
        Context::empty()
    })
}

fn ranker_or_warn(registry: &ModelRegistry, lang: &str) -> Option<Arc<dyn Ranker>> {
    registry
        .ranker(lang)
        .map_err(|e| log::warn!("no ranker for '{lang}', candidates keep score 0: {e}"))
        .ok()
}

fn score_against(
    ranker: &dyn Ranker,
    relatedness: &dyn RelatednessContext,
    mention: &Mention,
    candidate: &Candidate,
    contexts: &[&Context],
    lang: &str,
) -> Result<f64> {
    let mut sum = 0.0;
    for context in contexts {
        let related = relatedness.relatedness_to(mention, candidate, context, lang)?;
        sum += ranker.score(candidate.prior_probability, related, context.quality())?;
    }
    let score = sum / contexts.len().max(1) as f64;
    if !score.is_finite() {
        return Err(crate::Error::scoring(format!("rank score is {score}")));
    }
    Ok(score)
}

fn rank_entry(
    entry: Entry,
    ranker: Option<&dyn Ranker>,
    relatedness: &dyn RelatednessContext,
    contexts: &[&Context],
    lang: &str,
) -> Entry {
    let Entry {
        mention,
        hypotheses,
    } = entry;
    let mut candidates = match hypotheses {
        Hypotheses::Ranked(candidates) => candidates,
        other => return Entry::new(mention, other),
    };
    for candidate in &mut candidates {
        candidate.rank_score = match ranker {
            Some(ranker) => {
                score_against(ranker, relatedness, &mention, candidate, contexts, lang)
                    .unwrap_or_else(|e| {
                        log::warn!(
                            "scoring {} for '{}' failed: {e}",
                            candidate.kb_id,
                            mention.raw_text
                        );
                        0.0
                    })
            }
            None => 0.0,
        };
    }
    sort_candidates(&mut candidates);
    Entry::new(mention, Hypotheses::Ranked(candidates))
}

/// Rank every candidate against the document context.
#[must_use]
pub fn rank(
    map: CandidateMap,
    relatedness: &dyn RelatednessContext,
    registry: &ModelRegistry,
    lang: &str,
) -> CandidateMap {
    let pinned = user_mentions(&map);
    let context = document_context(relatedness, &map, &pinned, lang);
    let ranker = ranker_or_warn(registry, lang);
    let contexts = [&context];
    map.into_iter()
        .map(|entry| rank_entry(entry, ranker.as_deref(), relatedness, &contexts, lang))
        .collect()
}

/// Rank every candidate against the document context and the local
/// windows of `text` around its mention.
///
/// Each candidate's score is the mean over `1 + n` contexts. Without
/// text, this is [`rank`].
#[must_use]
pub fn rank_with_local_contexts(
    map: CandidateMap,
    text: Option<&str>,
    relatedness: &dyn RelatednessContext,
    registry: &ModelRegistry,
    lang: &str,
    max_windows: usize,
) -> CandidateMap {
    let pinned = user_mentions(&map);
    let document = document_context(relatedness, &map, &pinned, lang);
    let ranker = ranker_or_warn(registry, lang);

    map.into_iter()
        .map(|entry| {
            let locals: Vec<Context> = match (text, &entry.hypotheses) {
                (Some(text), Hypotheses::Ranked(_)) => {
                    local_windows(text, &entry.mention.raw_text, max_windows)
                        .iter()
                        .filter_map(|window| {
                            relatedness
                                .build_from_text(window, &pinned, lang)
                                .map_err(|e| log::warn!("local context skipped: {e}"))
                                .ok()
                        })
                        .collect()
                }
                _ => Vec::new(),
            };
            let contexts: Vec<&Context> = std::iter::once(&document).chain(&locals).collect();
            rank_entry(entry, ranker.as_deref(), relatedness, &contexts, lang)
        })
        .collect()
}
