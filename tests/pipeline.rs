//! End-to-end tests of the disambiguation pipeline.
//!
//! Scores come from the default logistic weights and category-overlap
//! relatedness over small hand-built indexes.

use std::sync::Arc;

use entlink::candidates::CandidateGenerator;
use entlink::kb::PageType;
use entlink::models::LogisticSelector;
use entlink::prelude::*;

const PARIS_CITY: u64 = 22989;
const PARIS_HILTON: u64 = 37130;
const PARIS_TEXAS: u64 = 128608;
const FRANCE: u64 = 5843419;
const OBAMA: u64 = 534366;
const MERCURY_DAB: u64 = 19680;
const MERCURY_PLANET: u64 = 19694;
const MERCURY_ELEMENT: u64 = 18617;

fn english() -> InMemoryKb {
    InMemoryKb::new("en")
        .with_label(
            "Paris",
            0.4,
            vec![
                Sense::article(PARIS_CITY, "Paris", 0.7)
                    .with_category(100u64, "Capitals in Europe")
                    .with_category(101u64, "France")
                    .with_translation("de", "Paris")
                    .with_translation("fr", "Paris"),
                Sense::article(PARIS_HILTON, "Paris Hilton", 0.05)
                    .with_category(200u64, "American socialites"),
                Sense::article(PARIS_TEXAS, "Paris, Texas", 0.02)
                    .with_category(201u64, "Cities in Texas"),
            ],
        )
        .with_label(
            "France",
            0.6,
            vec![Sense::article(FRANCE, "France", 0.9)
                .with_category(101u64, "France")
                .with_category(102u64, "Countries in Europe")],
        )
        .with_label(
            "Barack Obama",
            0.8,
            vec![Sense::article(OBAMA, "Barack Obama", 0.95)
                .with_category(300u64, "Presidents of the United States")],
        )
        .with_label(
            "Obama",
            0.5,
            vec![Sense::article(OBAMA, "Barack Obama", 0.9)
                .with_category(300u64, "Presidents of the United States")],
        )
        .with_label(
            "Mercury",
            0.5,
            vec![
                Sense::article(MERCURY_DAB, "Mercury", 0.4)
                    .with_page_type(PageType::Disambiguation),
                Sense::article(MERCURY_PLANET, "Mercury (planet)", 0.35)
                    .with_category(400u64, "Planets of the Solar System"),
                Sense::article(MERCURY_ELEMENT, "Mercury (element)", 0.2)
                    .with_category(401u64, "Chemical elements"),
                Sense::article(9u64, "List of things named Mercury", 0.05),
            ],
        )
        .with_domains(PARIS_CITY, &["geography"])
}

fn french() -> InMemoryKb {
    InMemoryKb::new("fr").with_label(
        "Paris",
        0.5,
        vec![Sense::article(681159u64, "Paris", 0.7)
            .with_category(1u64, "Capitale européenne")
            .with_translation("en", "Paris")
            .with_translation("de", "Paris")
            .with_translation("it", "Parigi")],
    )
}

fn engine() -> Disambiguator {
    Disambiguator::new(
        KbSet::new().with(english().with_article("Paris", PARIS_CITY)).with(french()),
        EngineConfig::default(),
    )
}

fn ids(entities: &[LinkedEntity]) -> Vec<Option<u64>> {
    entities.iter().map(|e| e.resolved_id.map(KbId::get)).collect()
}

// =============================================================================
// Single-best disambiguation
// =============================================================================

#[test]
fn paris_resolves_to_city_in_french_context() {
    let request = DisambiguationRequest::new(vec![
        Mention::new("Paris", 0, 5),
        Mention::new("France", 24, 30),
    ])
    .with_text("Paris is the capital of France")
    .with_language("en");

    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(PARIS_CITY), Some(FRANCE)]);
    // rank = sigmoid(-2 + 3*0.7 + 4*(1/3) + 0.5*0.8)
    assert!((out[0].confidence - 0.862).abs() < 1e-3, "got {}", out[0].confidence);
    assert_eq!(out[0].preferred_title.as_deref(), Some("Paris"));
    assert_eq!(out[0].domains, vec!["geography".to_string()]);
}

#[test]
fn rare_senses_above_the_prior_floor_are_generated() {
    let kbs = KbSet::new().with(english());
    let config = EngineConfig::default();
    let generator = CandidateGenerator::for_language(&kbs, "en", &config).unwrap();
    let map = generator.generate(vec![Mention::new("Paris", 0, 5)]);
    // 0.02 clears min_sense_probability = 0.01
    let generated: Vec<u64> = map
        .iter()
        .flat_map(|entry| entry.hypotheses.candidates())
        .map(|c| c.kb_id.get())
        .collect();
    assert_eq!(generated, vec![PARIS_CITY, PARIS_HILTON, PARIS_TEXAS]);

    let request = DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)]).with_language("en");
    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(PARIS_CITY)]);
}

#[test]
fn unpinned_user_mention_is_disambiguated() {
    let request = DisambiguationRequest::new(vec![
        Mention::new("Paris", 0, 5).user_supplied(),
        Mention::new("France", 24, 30),
    ])
    .with_language("en");

    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(PARIS_CITY), Some(FRANCE)]);
    assert_eq!(out[0].origin, Origin::User);
    assert!(out[0].confidence < 1.0);
}

#[test]
fn pinned_mention_seeds_context() {
    let request = DisambiguationRequest::new(vec![
        Mention::new("Paris", 0, 5),
        Mention::new("France", 24, 30).pinned_to(KbId(FRANCE)),
    ])
    .with_language("en");

    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(PARIS_CITY), Some(FRANCE)]);
    assert_eq!(out[1].origin, Origin::User);
    assert_eq!(out[1].confidence, 1.0);
    // quality rises to (1.0 + 0.7) / 2
    assert!(out[0].confidence > 0.862);
}

#[test]
fn disambiguation_and_list_pages_never_win() {
    let request = DisambiguationRequest::new(vec![Mention::new("Mercury", 0, 7)])
        .with_language("en");
    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(MERCURY_PLANET)]);

    let all = engine()
        .disambiguate(&request.nbest(true).short_text(true))
        .unwrap();
    assert!(ids(&all).iter().all(|id| *id != Some(MERCURY_DAB) && *id != Some(9)));
}

#[test]
fn unknown_untyped_mentions_are_dropped_typed_ones_kept() {
    let request = DisambiguationRequest::new(vec![
        Mention::new("Zorblax", 0, 7),
        Mention::new("ACME Corp", 10, 19).with_type(EntityType::Organization),
    ])
    .with_language("en");
    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].raw_text, "ACME Corp");
    assert!(out[0].resolved_id.is_none());
    assert_eq!(out[0].semantic_type, Some(EntityType::Organization));
}

#[test]
fn empty_request_gives_empty_output() {
    let out = engine()
        .disambiguate(&DisambiguationRequest::new(vec![]).with_language("en"))
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn raising_entity_threshold_drops_weak_resolutions() {
    let engine = Disambiguator::builder(KbSet::new().with(english()))
        .config(EngineConfig::default().with_min_entity_score(0.9))
        .build()
        .unwrap();
    let request =
        DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)]).with_language("en");
    assert!(engine.disambiguate(&request).unwrap().is_empty());
}

#[test]
fn invalid_config_is_rejected_by_builder() {
    let result = Disambiguator::builder(KbSet::new().with(english()))
        .config(EngineConfig::default().with_max_senses(0))
        .build();
    assert!(matches!(result, Err(Error::Config(_))));
}

// =============================================================================
// Overlaps and short text
// =============================================================================

fn obama_request() -> DisambiguationRequest {
    DisambiguationRequest::new(vec![
        Mention::new("Barack Obama", 0, 12),
        Mention::new("Obama", 7, 12),
    ])
    .with_text("Barack Obama")
    .with_language("en")
}

#[test]
fn longer_mention_wins_overlap() {
    let out = engine().disambiguate(&obama_request()).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].raw_text, "Barack Obama");
    assert_eq!(out[0].resolved_id, Some(KbId(OBAMA)));
}

#[test]
fn short_text_demotes_instead_of_removing() {
    let single = engine().disambiguate(&obama_request()).unwrap();
    let short = engine()
        .disambiguate(&obama_request().short_text(true))
        .unwrap();
    assert_eq!(short.len(), 2);
    assert_eq!(short[0].confidence, single[0].confidence);
    assert_eq!(short[1].raw_text, "Obama");
    assert!(short[1].confidence < 0.5);
}

// =============================================================================
// N-best
// =============================================================================

#[test]
fn nbest_keeps_several_candidates_in_score_order() {
    let request = DisambiguationRequest::new(vec![Mention::new("Mercury", 0, 7)])
        .with_language("en")
        .short_text(true)
        .nbest(true);
    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(MERCURY_PLANET), Some(MERCURY_ELEMENT)]);
    assert!(out[0].confidence >= out[1].confidence);
}

#[test]
fn nbest_skips_overlap_resolution() {
    let out = engine().disambiguate(&obama_request().nbest(true)).unwrap();
    assert_eq!(out.len(), 2);
}

// =============================================================================
// Enrichment
// =============================================================================

#[test]
fn french_entity_gets_english_domains_and_target_titles() {
    let request = DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)])
        .with_language("fr")
        .with_target_languages(&["de"]);
    let out = engine().disambiguate(&request).unwrap();
    assert_eq!(ids(&out), vec![Some(681159)]);
    assert_eq!(out[0].domains, vec!["geography".to_string()]);
    assert_eq!(out[0].translations.len(), 1);
    assert_eq!(out[0].translations["de"], "Paris");
}

#[test]
fn missing_language_is_fatal() {
    let request =
        DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)]).with_language("ja");
    let err = engine().disambiguate(&request).unwrap_err();
    assert!(matches!(err, Error::LanguageNotLoaded(ref l) if l == "ja"));
    assert!(err.is_fatal());
}

// =============================================================================
// Batch and term vectors
// =============================================================================

#[test]
fn batch_results_follow_request_order() {
    let requests = vec![
        DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)]).with_language("en"),
        DisambiguationRequest::new(vec![Mention::new("Paris", 0, 5)]).with_language("ja"),
        obama_request(),
    ];
    let results = engine().disambiguate_batch(&requests);
    assert_eq!(results.len(), 3);
    assert_eq!(ids(results[0].as_ref().unwrap()), vec![Some(PARIS_CITY)]);
    assert!(results[1].is_err());
    assert_eq!(ids(results[2].as_ref().unwrap()), vec![Some(OBAMA)]);
}

#[test]
fn terms_are_resolved_in_order() {
    let request = TermRequest {
        terms: vec![
            WeightedTerm::new("Paris", 0.8),
            WeightedTerm::new("zorblax", 0.3),
            WeightedTerm::new("France", 0.5),
        ],
        text: Some("A trip to Paris, the capital of France.".to_string()),
        language: Some("en".to_string()),
        ..TermRequest::default()
    };
    let results = engine().disambiguate_terms(&request).unwrap();
    let terms: Vec<_> = results.iter().map(|r| r.term.as_str()).collect();
    assert_eq!(terms, vec!["Paris", "zorblax", "France"]);
    assert_eq!(ids(&results[0].entities), vec![Some(PARIS_CITY)]);
    assert!(results[1].entities.is_empty());
    assert_eq!(ids(&results[2].entities), vec![Some(FRANCE)]);
    assert_eq!(results[2].score, 0.5);
}

#[test]
fn supplied_term_entities_are_returned_as_given() {
    let berlin = Mention::new("Berlin", 0, 6).pinned_to(KbId(3354));
    let request = TermRequest {
        terms: vec![
            WeightedTerm {
                term: "Berlin".to_string(),
                score: 0.9,
                entities: vec![berlin],
            },
            WeightedTerm::new("Paris", 0.4),
        ],
        language: Some("en".to_string()),
        ..TermRequest::default()
    };
    let results = engine().disambiguate_terms(&request).unwrap();
    assert_eq!(ids(&results[0].entities), vec![Some(3354)]);
    assert_eq!(ids(&results[1].entities), vec![Some(PARIS_CITY)]);
}

/// Ranker whose score is the sense prior.
struct PriorRanker;

impl Ranker for PriorRanker {
    fn score(&self, prior: f64, _relatedness: f64, _quality: f64) -> Result<f64> {
        Ok(prior)
    }
}

struct PriorModels;

impl ModelFactory for PriorModels {
    fn build_ranker(&self, _lang: &str) -> Result<Arc<dyn Ranker>> {
        Ok(Arc::new(PriorRanker))
    }

    fn build_selector(&self, _lang: &str) -> Result<Arc<dyn Selector>> {
        Ok(Arc::new(LogisticSelector::default()))
    }
}

fn prior_ranked_engine() -> Disambiguator {
    let kb = InMemoryKb::new("en").with_label(
        "Paris",
        0.4,
        vec![
            Sense::article(1u64, "Paris", 0.7),
            Sense::article(2u64, "Paris Hilton", 0.4),
            Sense::article(3u64, "Paris (Texas)", 0.3),
            Sense::article(4u64, "Paris (mythology)", 0.1),
        ],
    );
    Disambiguator::builder(KbSet::new().with(kb))
        .models(Arc::new(PriorModels))
        .build()
        .unwrap()
}

fn paris_terms(nbest: bool) -> TermRequest {
    TermRequest {
        terms: vec![WeightedTerm::new("Paris", 1.0)],
        language: Some("en".to_string()),
        nbest,
        ..TermRequest::default()
    }
}

#[test]
fn nbest_terms_keep_every_candidate_above_the_ranker_floor() {
    let results = prior_ranked_engine()
        .disambiguate_terms(&paris_terms(true))
        .unwrap();
    let entities = &results[0].entities;
    // 0.1 sits on the floor and is dropped; 0.4 and 0.3 both survive
    assert_eq!(ids(entities), vec![Some(1), Some(2), Some(3)]);
    let scores: Vec<f64> = entities.iter().map(|e| e.confidence).collect();
    assert_eq!(scores, vec![0.7, 0.4, 0.3]);
}

#[test]
fn single_best_terms_keep_only_the_top_candidate() {
    let results = prior_ranked_engine()
        .disambiguate_terms(&paris_terms(false))
        .unwrap();
    assert_eq!(ids(&results[0].entities), vec![Some(1)]);
}
