//! In-memory knowledge base loaded from a JSON snapshot.
//!
//! Snapshot layout:
//!
//! ```json
//! {
//!   "language": "en",
//!   "labels": {
//!     "Paris": {
//!       "link_probability": 0.41,
//!       "senses": [
//!         { "id": 22989, "title": "Paris", "prior_probability": 0.7,
//!           "parent_categories": [{ "id": 9001, "title": "Capitals in Europe" }],
//!           "translations": { "fr": "Paris" } }
//!       ]
//!     }
//!   },
//!   "domains": { "22989": ["geography"] },
//!   "frequencies": { "the": 7.73 }
//! }
//! ```
//!
//! Label lookup is exact first, then case-insensitive.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use entlink_core::{Category, KbId};

use super::{KnowledgeBase, Label, PageType, Sense};
use crate::Result;

/// Serializable content of an [`InMemoryKb`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KbSnapshot {
    /// ISO 639-1 code
    pub language: String,
    /// Surface string → label
    pub labels: HashMap<String, Label>,
    /// Extra title → id entries for pages that are no label's sense
    pub articles: HashMap<String, KbId>,
    /// Domain map; absent means the language has none
    pub domains: Option<HashMap<KbId, Vec<String>>>,
    /// Word → Zipf frequency
    pub frequencies: HashMap<String, f64>,
}

/// Hash-map backed [`KnowledgeBase`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryKb {
    language: String,
    labels: HashMap<String, Label>,
    folded: HashMap<String, String>,
    titles: HashMap<String, KbId>,
    categories: HashMap<KbId, Vec<Category>>,
    domains: Option<HashMap<KbId, Vec<String>>>,
    frequencies: HashMap<String, f64>,
}

impl InMemoryKb {
    /// Empty knowledge base for `language`.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    /// Build from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: KbSnapshot) -> Self {
        let mut kb = Self::new(snapshot.language);
        for (surface, label) in snapshot.labels {
            kb.insert_label(surface, label);
        }
        kb.titles.extend(snapshot.articles);
        kb.domains = snapshot.domains;
        kb.frequencies = snapshot.frequencies;
        kb
    }

    /// Parse a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: KbSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a JSON snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Add a label.
    #[must_use]
    pub fn with_label(
        mut self,
        surface: impl Into<String>,
        link_probability: f64,
        senses: Vec<Sense>,
    ) -> Self {
        self.insert_label(
            surface.into(),
            Label {
                link_probability,
                senses,
            },
        );
        self
    }

    /// Set the domain tags of a page. Creates the domain map if needed.
    #[must_use]
    pub fn with_domains(mut self, id: impl Into<KbId>, domains: &[&str]) -> Self {
        self.domains
            .get_or_insert_with(HashMap::new)
            .insert(id.into(), domains.iter().map(|d| d.to_string()).collect());
        self
    }

    /// Register a title for a page that is not a label sense.
    #[must_use]
    pub fn with_article(mut self, title: impl Into<String>, id: impl Into<KbId>) -> Self {
        self.titles.insert(title.into(), id.into());
        self
    }

    /// Set the Zipf frequency of a word.
    #[must_use]
    pub fn with_frequency(mut self, word: impl Into<String>, zipf: f64) -> Self {
        self.frequencies.insert(word.into().to_lowercase(), zipf);
        self
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// No labels loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn insert_label(&mut self, surface: String, mut label: Label) {
        label.senses.sort_by(|a, b| {
            b.prior_probability
                .partial_cmp(&a.prior_probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for sense in &label.senses {
            if sense.page_type == PageType::Article {
                if let Some(title) = &sense.title {
                    self.titles.entry(title.clone()).or_insert(sense.id);
                }
            }
            self.categories
                .entry(sense.id)
                .or_insert_with(|| sense.parent_categories.clone());
        }
        self.folded
            .entry(surface.to_lowercase())
            .or_insert_with(|| surface.clone());
        self.labels.insert(surface, label);
    }
}

impl KnowledgeBase for InMemoryKb {
    fn language(&self) -> &str {
        &self.language
    }

    fn label(&self, surface: &str) -> Option<Label> {
        self.labels
            .get(surface)
            .or_else(|| {
                self.folded
                    .get(&surface.to_lowercase())
                    .and_then(|key| self.labels.get(key))
            })
            .cloned()
    }

    fn article_by_title(&self, title: &str) -> Option<KbId> {
        self.titles.get(title).copied()
    }

    fn domains(&self, id: KbId) -> Option<Vec<String>> {
        self.domains.as_ref()?.get(&id).cloned()
    }

    fn parent_categories(&self, id: KbId) -> Vec<Category> {
        self.categories.get(&id).cloned().unwrap_or_default()
    }

    fn zipf_frequency(&self, word: &str) -> Option<f64> {
        self.frequencies.get(&word.to_lowercase()).copied()
    }
}
