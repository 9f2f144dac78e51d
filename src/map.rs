//! The candidate map: mentions in position order with their hypotheses.
//!
//! ```text
//!   [0,6)   "Barack"        Ranked[Barack (0.61)]
//!   [0,12)  "Barack Obama"  Ranked[Barack Obama (0.93), ...]
//!   [7,12)  "Obama"         Ranked[Barack Obama (0.88), Obama, Fukui (0.02)]
//!   [20,27) "Germany"       Pinned
//!   [31,35) "ACME"          TypedOnly
//! ```
//!
//! Every pipeline stage consumes a map and returns a new one.

use entlink_core::{Candidate, Mention};

/// What the pipeline knows about a mention.
#[derive(Debug, Clone, PartialEq)]
pub enum Hypotheses {
    /// User mention with a pre-resolved id; never looked up or scored.
    Pinned,
    /// Typed mention with no candidate left; emitted with its type only.
    TypedOnly,
    /// Candidates, best first once ranked. Never empty.
    Ranked(Vec<Candidate>),
}

impl Hypotheses {
    /// Classify a candidate list: non-empty lists are `Ranked`, empty
    /// lists survive as `TypedOnly` when the mention is typed and are
    /// dropped (`None`) otherwise.
    #[must_use]
    pub fn from_candidates(candidates: Vec<Candidate>, typed: bool) -> Option<Self> {
        if !candidates.is_empty() {
            Some(Hypotheses::Ranked(candidates))
        } else if typed {
            Some(Hypotheses::TypedOnly)
        } else {
            None
        }
    }

    /// Candidates, empty for `Pinned` and `TypedOnly`.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Hypotheses::Ranked(c) => c,
            Hypotheses::Pinned | Hypotheses::TypedOnly => &[],
        }
    }
}

/// A mention with its hypotheses.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The mention
    pub mention: Mention,
    /// Its hypotheses
    pub hypotheses: Hypotheses,
}

impl Entry {
    /// Pair a mention with hypotheses.
    #[must_use]
    pub fn new(mention: Mention, hypotheses: Hypotheses) -> Self {
        Self {
            mention,
            hypotheses,
        }
    }
}

/// Mentions ordered by `(start, end, index)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMap {
    entries: Vec<Entry>,
}

impl CandidateMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping position order.
    pub fn insert(&mut self, mention: Mention, hypotheses: Hypotheses) {
        let key = mention.position_key();
        let at = self
            .entries
            .partition_point(|e| e.mention.position_key() <= key);
        self.entries.insert(at, Entry::new(mention, hypotheses));
    }

    /// Number of mentions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No mentions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in position order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Mentions in position order.
    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.entries.iter().map(|e| &e.mention)
    }

    /// Pinned user mentions.
    pub fn pinned(&self) -> impl Iterator<Item = &Mention> {
        self.entries
            .iter()
            .filter(|e| matches!(e.hypotheses, Hypotheses::Pinned))
            .map(|e| &e.mention)
    }

    /// Total candidates across all mentions.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.hypotheses.candidates().len())
            .sum()
    }

    /// Look up an entry by mention index.
    #[must_use]
    pub fn by_index(&self, index: usize) -> Option<&Entry> {
        self.entries.iter().find(|e| e.mention.index == index)
    }
}

impl FromIterator<Entry> for CandidateMap {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut entries: Vec<Entry> = iter.into_iter().collect();
        entries.sort_by_key(|e| e.mention.position_key());
        Self { entries }
    }
}

impl IntoIterator for CandidateMap {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandidateMap {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
