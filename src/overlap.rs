//! Overlap resolution for single-best output.
//!
//! Every ordered pair of overlapping entities is arbitrated, first rule wins:
//!
//! | # | Condition                                                    | Verdict       |
//! |---|--------------------------------------------------------------|---------------|
//! | 1 | empty or whitespace-only surface text                        | remove it     |
//! | 2 | second typed + unresolved, first resolved with conf > 0.2    | remove second |
//! |   | first typed + unresolved, second resolved with conf > 0.2    | remove first  |
//! | 3 | same resolution, first typed, second untyped                 | remove second |
//! | 4 | second has lower arity (whitespace runs + 1)                 | remove second |
//! |   | same arity, second less confident                            | remove second |
//!
//! Spans overlap unless one ends strictly before the other starts, so
//! touching spans compete. In short-text mode losers are kept with half
//! their confidence instead of being removed.

use entlink_core::LinkedEntity;

/// Resolved entities at or below this confidence do not beat a typed,
/// unresolved rival.
pub const TYPED_RIVAL_MIN_CONFIDENCE: f64 = 0.2;

/// Outcome of comparing two overlapping entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Neither rule applies.
    KeepBoth,
    /// The first entity loses.
    RemoveFirst,
    /// The second entity loses.
    RemoveSecond,
}

fn typed_unresolved(e: &LinkedEntity) -> bool {
    e.is_typed() && !e.is_resolved()
}

fn confidently_resolved(e: &LinkedEntity) -> bool {
    e.is_resolved() && e.confidence > TYPED_RIVAL_MIN_CONFIDENCE
}

/// Arbitrate between two overlapping, non-blank entities.
#[must_use]
pub fn arbitrate(first: &LinkedEntity, second: &LinkedEntity) -> Verdict {
    if typed_unresolved(second) && confidently_resolved(first) {
        return Verdict::RemoveSecond;
    }
    if typed_unresolved(first) && confidently_resolved(second) {
        return Verdict::RemoveFirst;
    }
    if first.resolved_id == second.resolved_id && first.is_typed() && !second.is_typed() {
        return Verdict::RemoveSecond;
    }
    let (a1, a2) = (first.arity(), second.arity());
    if a2 < a1 || (a2 == a1 && second.confidence < first.confidence) {
        return Verdict::RemoveSecond;
    }
    Verdict::KeepBoth
}

/// Resolve overlaps in a list sorted by position.
///
/// Output order follows the input. With `short_text`, removed entities
/// are kept with their confidence halved.
#[must_use]
pub fn resolve_overlaps(entities: Vec<LinkedEntity>, short_text: bool) -> Vec<LinkedEntity> {
    let n = entities.len();
    let mut removed = vec![false; n];

    for i in 0..n {
        if removed[i] {
            continue;
        }
        if entities[i].is_blank() {
            removed[i] = true;
            continue;
        }
        for j in 0..n {
            if i == j || removed[j] || !entities[i].overlaps(&entities[j]) {
                continue;
            }
            if entities[j].is_blank() {
                removed[j] = true;
                continue;
            }
            match arbitrate(&entities[i], &entities[j]) {
                Verdict::RemoveSecond => removed[j] = true,
                Verdict::RemoveFirst => {
                    removed[i] = true;
                    break;
                }
                Verdict::KeepBoth => {}
            }
        }
    }

    let dropped = removed.iter().filter(|&&r| r).count();
    if dropped > 0 {
        log::debug!(
            "overlap resolution {} {dropped}/{n} entities",
            if short_text { "demoted" } else { "removed" }
        );
    }

    entities
        .into_iter()
        .zip(removed)
        .filter_map(|(mut entity, removed)| {
            if !removed {
                Some(entity)
            } else if short_text {
                entity.confidence /= 2.0;
                Some(entity)
            } else {
                None
            }
        })
        .collect()
}
