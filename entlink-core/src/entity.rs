//! Mentions, candidates and linked entities.
//!
//! ```text
//!   Mention ──(KB lookup)──► Candidate* ──(rank/select/prune)──► LinkedEntity
//!   "Paris" [12,17)          Paris (p=0.70)                        Paris, conf=0.83
//!                            Paris Hilton (p=0.05)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Identifier of a knowledge-base sense (a Wikipedia page id, a Wikidata
/// numeric id, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KbId(pub u64);

impl KbId {
    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for KbId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for KbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic type assigned by the upstream recognizer.
///
/// Standard types following CoNLL/OntoNotes conventions. Serialized as the
/// label string (`"PER"`, `"LOC"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    /// Person name (PER)
    Person,
    /// Organization name (ORG)
    Organization,
    /// Location/Place (LOC)
    Location,
    /// Date or time expression (DATE)
    Date,
    /// Monetary value (MONEY)
    Money,
    /// Percentage (PERCENT)
    Percent,
    /// Any other label, kept verbatim
    Other(String),
}

impl EntityType {
    /// Convert to standard label string (CoNLL format).
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            EntityType::Person => "PER",
            EntityType::Organization => "ORG",
            EntityType::Location => "LOC",
            EntityType::Date => "DATE",
            EntityType::Money => "MONEY",
            EntityType::Percent => "PERCENT",
            EntityType::Other(s) => s.as_str(),
        }
    }

    /// Parse from a label string. Unknown labels become `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_uppercase().as_str() {
            "PER" | "PERSON" | "B-PER" | "I-PER" => EntityType::Person,
            "ORG" | "ORGANIZATION" | "ORGANISATION" | "B-ORG" | "I-ORG" => {
                EntityType::Organization
            }
            "LOC" | "LOCATION" | "GPE" | "B-LOC" | "I-LOC" => EntityType::Location,
            "DATE" | "TIME" | "PERIOD" => EntityType::Date,
            "MONEY" | "CURRENCY" => EntityType::Money,
            "PERCENT" | "PERCENTAGE" => EntityType::Percent,
            _ => EntityType::Other(label.to_string()),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl From<String> for EntityType {
    fn from(label: String) -> Self {
        EntityType::from_label(&label)
    }
}

impl From<EntityType> for String {
    fn from(ty: EntityType) -> Self {
        ty.as_label().to_string()
    }
}

/// Who produced a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Supplied by the caller. May be pre-resolved to a KB id.
    User,
    /// Produced by an upstream recognizer.
    #[default]
    Automatic,
}

/// Number of whitespace runs in a surface string, plus one. Leading and
/// trailing runs count.
/// ```
/// use entlink_core::arity;
/// assert_eq!(arity("Barack Obama"), 2);
/// assert_eq!(arity("Obama"), 1);
/// assert_eq!(arity(" Obama"), 2);
/// assert_eq!(arity(""), 1);
/// ```
#[must_use]
pub fn arity(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        let space = c.is_whitespace();
        if space && !in_run {
            runs += 1;
        }
        in_run = space;
    }
    runs + 1
}

/// Spans conflict unless one ends strictly before the other starts.
///
/// Touching spans (`end1 == start2`) count as overlapping.
fn spans_conflict(start1: usize, end1: usize, start2: usize, end2: usize) -> bool {
    !(end2 < start1 || end1 < start2)
}

fn default_confidence() -> f64 {
    1.0
}

/// A detected span in the input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Surface text
    pub raw_text: String,
    /// Start position (byte offset)
    pub start: usize,
    /// End position (byte offset, exclusive)
    pub end: usize,
    /// Type from the upstream recognizer, if any
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<EntityType>,
    /// Producer of the mention
    #[serde(default)]
    pub origin: Origin,
    /// Probability that the surface string is used as a link; set during
    /// candidate generation
    #[serde(default)]
    pub link_probability: f64,
    /// Pre-resolved KB id (user mentions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_id: Option<KbId>,
    /// Upstream confidence (0.0-1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Insertion order within the request; assigned by the engine
    #[serde(default, skip_serializing)]
    pub index: usize,
}

impl Mention {
    /// Create an untyped automatic mention.
    #[must_use]
    pub fn new(raw_text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            raw_text: raw_text.into(),
            start,
            end,
            semantic_type: None,
            origin: Origin::Automatic,
            link_probability: 0.0,
            resolved_id: None,
            confidence: 1.0,
            index: 0,
        }
    }

    /// Set the semantic type.
    #[must_use]
    pub fn with_type(mut self, ty: EntityType) -> Self {
        self.semantic_type = Some(ty);
        self
    }

    /// Set the upstream confidence, clamped to [0, 1].
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Mark as a user mention pinned to `id`.
    #[must_use]
    pub fn pinned_to(mut self, id: KbId) -> Self {
        self.origin = Origin::User;
        self.resolved_id = Some(id);
        self
    }

    /// Mark as a user mention without a resolution.
    #[must_use]
    pub fn user_supplied(mut self) -> Self {
        self.origin = Origin::User;
        self
    }

    /// Has a semantic type.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.semantic_type.is_some()
    }

    /// User mention with a pre-resolved id; skips candidate generation.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.origin == Origin::User && self.resolved_id.is_some()
    }

    /// Check the span is non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(Error::invalid_input(format!(
                "mention '{}' has empty span [{}, {})",
                self.raw_text, self.start, self.end
            )));
        }
        Ok(())
    }

    /// Ordering key: start, then end, then insertion index.
    #[must_use]
    pub fn position_key(&self) -> (usize, usize, usize) {
        (self.start, self.end, self.index)
    }
}

/// A knowledge-base category. Titles may be missing in inconsistent indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: KbId,
    /// Category title
    #[serde(default)]
    pub title: Option<String>,
}

impl Category {
    /// Create a titled category.
    #[must_use]
    pub fn new(id: impl Into<KbId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
        }
    }
}

/// One KB sense hypothesised for a mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Sense id
    pub kb_id: KbId,
    /// Page title
    pub preferred_title: String,
    /// Commonness of this sense for the surface string
    pub prior_probability: f64,
    /// Accepted parent categories
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Language code → title
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
    /// Ranker output
    #[serde(default)]
    pub rank_score: f64,
    /// Selector output
    #[serde(default)]
    pub selection_score: f64,
}

impl Candidate {
    /// Create an unscored candidate.
    #[must_use]
    pub fn new(kb_id: impl Into<KbId>, preferred_title: impl Into<String>, prior: f64) -> Self {
        Self {
            kb_id: kb_id.into(),
            preferred_title: preferred_title.into(),
            prior_probability: prior,
            categories: Vec::new(),
            translations: BTreeMap::new(),
            rank_score: 0.0,
            selection_score: 0.0,
        }
    }

    /// Attach categories.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Attach cross-lingual titles.
    #[must_use]
    pub fn with_translations(mut self, translations: BTreeMap<String, String>) -> Self {
        self.translations = translations;
        self
    }

    /// Set the rank score.
    #[must_use]
    pub fn with_rank_score(mut self, score: f64) -> Self {
        self.rank_score = score;
        self
    }

    /// Category titles, skipping untitled entries.
    pub fn category_titles(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().filter_map(|c| c.title.as_deref())
    }
}

/// A disambiguated entity in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    /// Surface text
    pub raw_text: String,
    /// Start position (byte offset)
    pub start: usize,
    /// End position (byte offset, exclusive)
    pub end: usize,
    /// Upstream semantic type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<EntityType>,
    /// Producer of the underlying mention
    #[serde(default)]
    pub origin: Origin,
    /// Resolved KB id, `None` when only typed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_id: Option<KbId>,
    /// Final confidence
    pub confidence: f64,
    /// Selector output of the chosen candidate
    #[serde(default)]
    pub selection_score: f64,
    /// Title of the chosen sense
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_title: Option<String>,
    /// Titles in the requested target languages
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, String>,
    /// Domain tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    /// Insertion index of the source mention
    #[serde(default, skip_serializing)]
    pub mention_index: usize,
}

impl LinkedEntity {
    /// Entity carrying the mention as-is: pinned user mentions and
    /// typed mentions without surviving candidates. Confidence is the
    /// mention's own.
    #[must_use]
    pub fn from_mention(mention: &Mention) -> Self {
        Self {
            raw_text: mention.raw_text.clone(),
            start: mention.start,
            end: mention.end,
            semantic_type: mention.semantic_type.clone(),
            origin: mention.origin,
            resolved_id: mention.resolved_id,
            confidence: mention.confidence,
            selection_score: 0.0,
            preferred_title: None,
            translations: BTreeMap::new(),
            domains: Vec::new(),
            mention_index: mention.index,
        }
    }

    /// Entity resolved to `candidate`. Confidence is the rank score;
    /// all of the candidate's translations are carried over.
    #[must_use]
    pub fn from_candidate(mention: &Mention, candidate: &Candidate) -> Self {
        Self {
            resolved_id: Some(candidate.kb_id),
            confidence: candidate.rank_score,
            selection_score: candidate.selection_score,
            preferred_title: Some(candidate.preferred_title.clone()),
            translations: candidate.translations.clone(),
            ..Self::from_mention(mention)
        }
    }

    /// Has a KB id.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved_id.is_some()
    }

    /// Has a semantic type.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.semantic_type.is_some()
    }

    /// Surface text is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }

    /// Token count of the surface text.
    #[must_use]
    pub fn arity(&self) -> usize {
        arity(&self.raw_text)
    }

    /// Check for positional conflict. Touching spans conflict.
    #[must_use]
    pub fn overlaps(&self, other: &LinkedEntity) -> bool {
        spans_conflict(self.start, self.end, other.start, other.end)
    }

    /// Ordering key: start, then end, then source mention index.
    #[must_use]
    pub fn position_key(&self) -> (usize, usize, usize) {
        (self.start, self.end, self.mention_index)
    }
}
