//! The pruning cascade.
//!
//! ```text
//!   Stage A (selector):  drop candidates with Selector(rank, link_p, prior) < threshold
//!   Stage B (threshold):
//!     single-best  keep the first candidate with
//!                  (short_text && score > 0.10) || score > threshold
//!     n-best       keep each candidate, in order, if
//!                  short_text && score > 0.10
//!                  || nothing kept yet && score > threshold
//!                  || score > 0.6
//! ```
//!
//! In both stages a mention left without candidates survives as
//! `TypedOnly` when typed and is dropped otherwise.

use serde::{Deserialize, Serialize};

use entlink_core::Candidate;

use crate::map::{CandidateMap, Entry, Hypotheses};
use crate::models::Selector;

/// Short-text mode keeps candidates scoring above this.
pub const SHORT_TEXT_MIN_SCORE: f64 = 0.10;

/// N-best mode keeps any later candidate scoring above this.
pub const NBEST_MIN_SCORE: f64 = 0.6;

/// How many candidates survive per mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneMode {
    /// At most one candidate per mention; overlaps are resolved afterwards.
    #[default]
    SingleBest,
    /// Several ranked candidates per mention.
    NBest,
}

impl PruneMode {
    /// `NBest` when `nbest` is set.
    #[must_use]
    pub fn from_nbest(nbest: bool) -> Self {
        if nbest {
            PruneMode::NBest
        } else {
            PruneMode::SingleBest
        }
    }
}

/// Rebuild the map, replacing each candidate list with `keep(list)`.
fn retain_candidates<F>(map: CandidateMap, mut keep: F) -> CandidateMap
where
    F: FnMut(&entlink_core::Mention, Vec<Candidate>) -> Vec<Candidate>,
{
    map.into_iter()
        .filter_map(|Entry { mention, hypotheses }| match hypotheses {
            Hypotheses::Ranked(candidates) => {
                let kept = keep(&mention, candidates);
                Hypotheses::from_candidates(kept, mention.is_typed())
                    .map(|h| Entry::new(mention, h))
            }
            other => Some(Entry::new(mention, other)),
        })
        .collect()
}

/// Stage A: score with the selector and drop candidates below `threshold`.
///
/// A candidate the selector fails on keeps the default score of 0.
#[must_use]
pub fn prune_with_selector(
    map: CandidateMap,
    selector: &dyn Selector,
    threshold: f64,
) -> CandidateMap {
    let before = map.candidate_count();
    let pruned = retain_candidates(map, |mention, candidates| {
        candidates
            .into_iter()
            .filter_map(|mut candidate| {
                candidate.selection_score = selector
                    .score(
                        candidate.rank_score,
                        mention.link_probability,
                        candidate.prior_probability,
                    )
                    .unwrap_or_else(|e| {
                        log::warn!(
                            "selector failed on {} for '{}': {e}",
                            candidate.kb_id,
                            mention.raw_text
                        );
                        0.0
                    });
                (candidate.selection_score >= threshold).then_some(candidate)
            })
            .collect()
    });
    log::debug!(
        "selector kept {}/{} candidates at threshold {threshold}",
        pruned.candidate_count(),
        before
    );
    pruned
}

/// Stage B: keep candidates by rank score according to `mode`.
///
/// Candidate lists must already be sorted best first.
#[must_use]
pub fn prune_by_score(
    map: CandidateMap,
    mode: PruneMode,
    short_text: bool,
    threshold: f64,
) -> CandidateMap {
    let passes_short = |score: f64| short_text && score > SHORT_TEXT_MIN_SCORE;
    retain_candidates(map, |_, candidates| match mode {
        PruneMode::SingleBest => candidates
            .into_iter()
            .find(|c| passes_short(c.rank_score) || c.rank_score > threshold)
            .into_iter()
            .collect(),
        PruneMode::NBest => {
            let mut kept: Vec<Candidate> = Vec::new();
            for candidate in candidates {
                let score = candidate.rank_score;
                if passes_short(score)
                    || (kept.is_empty() && score > threshold)
                    || score > NBEST_MIN_SCORE
                {
                    kept.push(candidate);
                }
            }
            kept
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use entlink_core::{EntityType, KbId, Mention};

    /// Selector echoing the rank score.
    struct Echo;

    impl Selector for Echo {
        fn score(&self, rank: f64, _: f64, _: f64) -> Result<f64> {
            if rank < 0.0 {
                return Err(crate::Error::scoring("negative"));
            }
            Ok(rank)
        }
    }

    fn map_of(scores: &[f64], typed: bool) -> CandidateMap {
        let mut mention = Mention::new("Paris", 0, 5);
        if typed {
            mention = mention.with_type(EntityType::Location);
        }
        let candidates = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| Candidate::new(i as u64, "c", 0.5).with_rank_score(s))
            .collect();
        let mut map = CandidateMap::new();
        map.insert(mention, Hypotheses::Ranked(candidates));
        map
    }

    fn kept_ids(map: &CandidateMap) -> Vec<u64> {
        map.iter()
            .flat_map(|e| e.hypotheses.candidates())
            .map(|c| c.kb_id.get())
            .collect()
    }

    #[test]
    fn selector_threshold_is_inclusive() {
        let map = prune_with_selector(map_of(&[0.9, 0.5, 0.49], false), &Echo, 0.5);
        assert_eq!(kept_ids(&map), vec![0, 1]);
        let c = &map.iter().next().unwrap().hypotheses.candidates()[0];
        assert!((c.selection_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn selector_error_scores_zero() {
        let map = prune_with_selector(map_of(&[-1.0, 0.8], false), &Echo, 0.5);
        assert_eq!(kept_ids(&map), vec![1]);
    }

    #[test]
    fn emptied_mentions_typed_survive_untyped_drop() {
        let typed = prune_with_selector(map_of(&[0.1], true), &Echo, 0.5);
        assert_eq!(typed.iter().next().unwrap().hypotheses, Hypotheses::TypedOnly);
        let untyped = prune_with_selector(map_of(&[0.1], false), &Echo, 0.5);
        assert!(untyped.is_empty());
    }

    #[test]
    fn single_best_takes_first_passing() {
        let map = prune_by_score(map_of(&[0.14, 0.12], false), PruneMode::SingleBest, false, 0.15);
        assert!(map.is_empty());
        let map = prune_by_score(map_of(&[0.14, 0.12], false), PruneMode::SingleBest, true, 0.15);
        assert_eq!(kept_ids(&map), vec![0]);
    }

    #[test]
    fn nbest_rules() {
        // first above threshold, second neither short nor above 0.6, third above 0.6
        let map = prune_by_score(
            map_of(&[0.7, 0.3, 0.65, 0.05], false),
            PruneMode::NBest,
            false,
            0.15,
        );
        assert_eq!(kept_ids(&map), vec![0, 2]);

        let map = prune_by_score(
            map_of(&[0.3, 0.2, 0.11, 0.05], false),
            PruneMode::NBest,
            true,
            0.15,
        );
        assert_eq!(kept_ids(&map), vec![0, 1, 2]);
    }

    #[test]
    fn pinned_and_typed_pass_through() {
        let mut map = CandidateMap::new();
        map.insert(Mention::new("A", 0, 1).pinned_to(KbId(1)), Hypotheses::Pinned);
        map.insert(
            Mention::new("B", 2, 3).with_type(EntityType::Person),
            Hypotheses::TypedOnly,
        );
        let out = prune_by_score(
            prune_with_selector(map.clone(), &Echo, 0.99),
            PruneMode::SingleBest,
            false,
            0.99,
        );
        assert_eq!(out, map);
    }
}
