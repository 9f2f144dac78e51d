//! Per-language scorer cache with at-most-one construction.
//!
//! ```text
//!   rankers: Mutex<HashMap<lang, Arc<OnceCell<Arc<dyn Ranker>>>>>
//!                 │                       │
//!                 └ held only to fetch    └ get_or_try_init: one builder,
//!                   or create the slot      other callers block and share it
//! ```
//!
//! A failed build leaves the slot empty, so the next call retries.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ModelFactory, Ranker, Selector};
use crate::sync::{lock, Mutex};
use crate::Result;

type Slot<T> = Arc<OnceCell<Arc<T>>>;
type Slots<T> = Mutex<HashMap<String, Slot<T>>>;

fn slot<T: ?Sized>(slots: &Slots<T>, lang: &str) -> Slot<T> {
    let mut guard = lock(slots);
    Arc::clone(guard.entry(lang.to_string()).or_default())
}

fn loaded<T: ?Sized>(slots: &Slots<T>) -> Vec<String> {
    let guard = lock(slots);
    let mut langs: Vec<String> = guard
        .iter()
        .filter(|(_, s)| s.get().is_some())
        .map(|(l, _)| l.clone())
        .collect();
    langs.sort_unstable();
    langs
}

/// Lazily built, shared rankers and selectors keyed by language.
pub struct ModelRegistry {
    factory: Arc<dyn ModelFactory>,
    rankers: Slots<dyn Ranker>,
    selectors: Slots<dyn Selector>,
}

impl ModelRegistry {
    /// Registry building through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn ModelFactory>) -> Self {
        Self {
            factory,
            rankers: Mutex::new(HashMap::new()),
            selectors: Mutex::new(HashMap::new()),
        }
    }

    /// Ranker for `lang`, built on first use.
    pub fn ranker(&self, lang: &str) -> Result<Arc<dyn Ranker>> {
        let slot = slot(&self.rankers, lang);
        let model = slot.get_or_try_init(|| {
            log::info!("building ranker for '{lang}'");
            self.factory.build_ranker(lang)
        })?;
        Ok(Arc::clone(model))
    }

    /// Selector for `lang`, built on first use.
    pub fn selector(&self, lang: &str) -> Result<Arc<dyn Selector>> {
        let slot = slot(&self.selectors, lang);
        let model = slot.get_or_try_init(|| {
            log::info!("building selector for '{lang}'");
            self.factory.build_selector(lang)
        })?;
        Ok(Arc::clone(model))
    }

    /// Languages with a built ranker.
    #[must_use]
    pub fn ranker_languages(&self) -> Vec<String> {
        loaded(&self.rankers)
    }

    /// Languages with a built selector.
    #[must_use]
    pub fn selector_languages(&self) -> Vec<String> {
        loaded(&self.selectors)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("rankers", &self.ranker_languages())
            .field("selectors", &self.selector_languages())
            .finish()
    }
}
