//! Output enrichment: cross-lingual titles and domain tags.
//!
//! Domain maps are keyed by English page ids, so a non-English entity goes
//! through its English title first:
//!
//! ```text
//!   fr "Paris" (id 681159) ──translations["en"]──► "Paris" ──en index──► 22989 ──► ["geography"]
//! ```
//!
//! Missing maps, titles or indexes leave the field empty.

use entlink_core::LinkedEntity;

use crate::kb::KbSet;

/// Attaches translations and domains to resolved entities.
#[derive(Debug, Clone)]
pub struct Enricher<'a> {
    kbs: &'a KbSet,
    lang: &'a str,
    targets: &'a [String],
}

impl<'a> Enricher<'a> {
    /// Enricher for entities in `lang`, keeping titles in `targets`.
    #[must_use]
    pub fn new(kbs: &'a KbSet, lang: &'a str, targets: &'a [String]) -> Self {
        Self { kbs, lang, targets }
    }

    /// Enrich every resolved entity.
    #[must_use]
    pub fn enrich(&self, entities: Vec<LinkedEntity>) -> Vec<LinkedEntity> {
        entities.into_iter().map(|e| self.enrich_one(e)).collect()
    }

    fn enrich_one(&self, mut entity: LinkedEntity) -> LinkedEntity {
        if entity.is_resolved() {
            entity.domains = self.domains_for(&entity);
        }
        entity
            .translations
            .retain(|lang, _| self.targets.iter().any(|t| t == lang));
        entity
    }

    fn domains_for(&self, entity: &LinkedEntity) -> Vec<String> {
        let Some(id) = entity.resolved_id else {
            return Vec::new();
        };
        if self.lang == "en" {
            return self
                .kbs
                .english()
                .and_then(|kb| kb.domains(id))
                .unwrap_or_default();
        }
        let Some(english) = self.kbs.english() else {
            return Vec::new();
        };
        entity
            .translations
            .get("en")
            .and_then(|title| english.article_by_title(title))
            .and_then(|en_id| english.domains(en_id))
            .unwrap_or_default()
    }
}
