//! # entlink
//!
//! Entity disambiguation against a knowledge base.
//!
//! Given a text and the mentions found in it, `entlink` picks the knowledge
//! base entry each mention most likely refers to:
//!
//! - **Candidates**: every sense of the mention's surface form, filtered
//!   by prior probability and page type
//! - **Ranking**: a [`Ranker`](models::Ranker) scores each candidate
//!   against a relatedness context built from the other mentions
//! - **Pruning**: a [`Selector`](models::Selector) cascade, then a score
//!   threshold (single-best or n-best)
//! - **Overlaps**: competing spans are arbitrated in single-best mode
//! - **Enrichment**: cross-lingual titles and domain tags
//!
//! ## Quick Start
//!
//! ```rust
//! use entlink::prelude::*;
//!
//! let kb = InMemoryKb::new("en")
//!     .with_label("Paris", 0.4, vec![
//!         Sense::article(22989u64, "Paris", 0.7),
//!         Sense::article(37130u64, "Paris Hilton", 0.05),
//!     ]);
//! let engine = Disambiguator::new(KbSet::new().with(kb), EngineConfig::default());
//!
//! let request = DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)])
//!     .with_text("Paris is lovely in spring");
//! for entity in engine.disambiguate(&request)? {
//!     println!("{} -> {:?} ({:.2})", entity.raw_text, entity.resolved_id, entity.confidence);
//! }
//! # Ok::<(), entlink::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Effect |
//! |---------|---------|--------|
//! | `fast-lock` | yes | `parking_lot` locks in the model registry and caches |
//!
//! ## Thread Safety
//!
//! [`Disambiguator`](engine::Disambiguator) is `Send + Sync`. Share it behind
//! an `Arc`; per-language models are built once, on first use.

#![warn(missing_docs)]

pub mod candidates;
pub mod config;
pub mod context;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod kb;
pub mod lang;
pub mod map;
pub mod models;
pub mod overlap;
pub mod pruning;
pub mod ranking;
pub mod registry;
pub mod relatedness;
pub mod similarity;
pub mod sync;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use entlink::prelude::*;
    //!
    //! let engine = Disambiguator::new(
    //!     KbSet::new().with(InMemoryKb::new("en")),
    //!     EngineConfig::default(),
    //! );
    //! let out = engine.disambiguate(&DisambiguationRequest::new(vec![]))?;
    //! assert!(out.is_empty());
    //! # Ok::<(), entlink::Error>(())
    //! ```
    pub use crate::config::{EngineConfig, LanguageConfig};
    pub use crate::engine::{
        DisambiguationRequest, Disambiguator, DisambiguatorBuilder, TermRequest, TermResult,
        WeightedTerm,
    };
    pub use crate::error::{Error, Result};
    pub use crate::kb::{InMemoryKb, KbSet, KnowledgeBase, Label, PageType, Sense};
    pub use crate::models::{LogisticModels, ModelFactory, Ranker, Selector};
    pub use crate::pruning::PruneMode;
    pub use crate::relatedness::{CategoryRelatedness, Context, RelatednessContext};
    pub use entlink_core::{
        Candidate, Category, EntityType, KbId, LinkedEntity, Mention, Origin,
    };
}

// Re-exports
pub use config::{EngineConfig, LanguageConfig};
pub use engine::{
    DisambiguationRequest, Disambiguator, DisambiguatorBuilder, TermRequest, TermResult,
    WeightedTerm,
};
pub use entlink_core::{Candidate, Category, EntityType, KbId, LinkedEntity, Mention, Origin};
pub use error::{Error, Result};
pub use kb::{InMemoryKb, KbSet, KnowledgeBase};
pub use map::{CandidateMap, Hypotheses};
pub use pruning::PruneMode;
