//! Knowledge-base boundary.
//!
//! The disambiguator only needs a narrow view of the index:
//!
//! ```text
//!   label("Paris") ──► Label { link_probability: 0.41,
//!                              senses: [Paris (0.70), Paris, Texas (0.05), ...] }
//!   article_by_title("Paris") ──► KbId(22989)
//!   domains(KbId(22989)) ──► ["geography"]
//! ```
//!
//! Implementations are per language; [`KbSet`] groups them and reports a
//! missing language as [`Error::LanguageNotLoaded`](crate::Error).

pub mod memory;

pub use memory::{InMemoryKb, KbSnapshot};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use entlink_core::{Category, KbId};

use crate::{Error, Result};

/// Kind of page a sense points at. Only articles become candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Regular article
    #[default]
    Article,
    /// Redirect page
    Redirect,
    /// Category page
    Category,
    /// Disambiguation page
    Disambiguation,
    /// Template page
    Template,
    /// Anything else the index knows about
    #[serde(other)]
    Other,
}

/// One sense of a label, as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    /// Page id
    pub id: KbId,
    /// Page title; may be missing in an inconsistent index
    #[serde(default)]
    pub title: Option<String>,
    /// Page kind
    #[serde(default)]
    pub page_type: PageType,
    /// Commonness of this sense for the label
    pub prior_probability: f64,
    /// Parent categories
    #[serde(default)]
    pub parent_categories: Vec<Category>,
    /// Language code → title
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

impl Sense {
    /// An article sense with no categories or translations.
    #[must_use]
    pub fn article(id: impl Into<KbId>, title: impl Into<String>, prior: f64) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            page_type: PageType::Article,
            prior_probability: prior,
            parent_categories: Vec::new(),
            translations: BTreeMap::new(),
        }
    }

    /// Set the page type.
    #[must_use]
    pub fn with_page_type(mut self, page_type: PageType) -> Self {
        self.page_type = page_type;
        self
    }

    /// Add a titled parent category.
    #[must_use]
    pub fn with_category(mut self, id: impl Into<KbId>, title: impl Into<String>) -> Self {
        self.parent_categories.push(Category::new(id, title));
        self
    }

    /// Add a cross-lingual title.
    #[must_use]
    pub fn with_translation(mut self, lang: impl Into<String>, title: impl Into<String>) -> Self {
        self.translations.insert(lang.into(), title.into());
        self
    }
}

/// Result of a label lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Probability that the label is used as a link
    pub link_probability: f64,
    /// Senses, highest prior first
    #[serde(default)]
    pub senses: Vec<Sense>,
}

/// Read-only view of a per-language knowledge-base index.
pub trait KnowledgeBase: Send + Sync {
    /// ISO 639-1 code of the index.
    fn language(&self) -> &str;

    /// Look up a surface string.
    fn label(&self, surface: &str) -> Option<Label>;

    /// Resolve an article title to its id.
    fn article_by_title(&self, title: &str) -> Option<KbId>;

    /// Domain tags. `None` when the index has no domain map or no entry.
    fn domains(&self, id: KbId) -> Option<Vec<String>>;

    /// Parent categories of a page.
    fn parent_categories(&self, id: KbId) -> Vec<Category>;

    /// Zipf frequency of a word in the language, when known.
    fn zipf_frequency(&self, _word: &str) -> Option<f64> {
        None
    }
}

/// Knowledge bases keyed by language.
#[derive(Clone, Default)]
pub struct KbSet {
    bases: HashMap<String, Arc<dyn KnowledgeBase>>,
}

impl KbSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a knowledge base under its own language code.
    #[must_use]
    pub fn with(mut self, kb: impl KnowledgeBase + 'static) -> Self {
        self.insert(Arc::new(kb));
        self
    }

    /// Add a shared knowledge base, replacing any for the same language.
    pub fn insert(&mut self, kb: Arc<dyn KnowledgeBase>) {
        self.bases.insert(kb.language().to_string(), kb);
    }

    /// Knowledge base for `lang`.
    pub fn get(&self, lang: &str) -> Result<&Arc<dyn KnowledgeBase>> {
        self.bases
            .get(lang)
            .ok_or_else(|| Error::language_not_loaded(lang))
    }

    /// English knowledge base, if loaded.
    #[must_use]
    pub fn english(&self) -> Option<&Arc<dyn KnowledgeBase>> {
        self.bases.get("en")
    }

    /// Loaded language codes, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.bases.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

impl std::fmt::Debug for KbSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KbSet")
            .field("languages", &self.languages())
            .finish()
    }
}
