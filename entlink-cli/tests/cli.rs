//! End-to-end tests for the entlink binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const EN_KB: &str = r#"{
  "language": "en",
  "labels": {
    "Paris": {
      "link_probability": 0.4,
      "senses": [
        { "id": 22989, "title": "Paris", "prior_probability": 0.7,
          "parent_categories": [
            { "id": 100, "title": "Capitals in Europe" },
            { "id": 101, "title": "France" }
          ],
          "translations": { "de": "Paris", "fr": "Paris" } },
        { "id": 37130, "title": "Paris Hilton", "prior_probability": 0.05,
          "parent_categories": [{ "id": 200, "title": "American socialites" }] }
      ]
    },
    "France": {
      "link_probability": 0.6,
      "senses": [
        { "id": 5843419, "title": "France", "prior_probability": 0.9,
          "parent_categories": [
            { "id": 101, "title": "France" },
            { "id": 102, "title": "Countries in Europe" }
          ] }
      ]
    }
  },
  "domains": { "22989": ["geography"] }
}"#;

fn fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let kb = dir.path().join("en.json");
    fs::write(&kb, EN_KB).unwrap();
    (dir, kb)
}

fn entlink() -> Command {
    let mut cmd = Command::cargo_bin("entlink").unwrap();
    // keep the user's config file out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent").env_remove("RUST_LOG");
    cmd
}

// =============================================================================
// link
// =============================================================================

#[test]
fn link_quick_form_resolves_paris() {
    let (_dir, kb) = fixture();
    let output = entlink()
        .args(["link", "--kb"])
        .arg(&kb)
        .args(["-t", "Paris is the capital of France"])
        .args(["-m", "Paris:0:5", "-m", "France:24:30", "-l", "en"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let entities: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entities = entities.as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["raw_text"], "Paris");
    assert_eq!(entities[0]["resolved_id"], 22989);
    assert_eq!(entities[0]["domains"][0], "geography");
    assert_eq!(entities[1]["resolved_id"], 5843419);
}

#[test]
fn link_reads_request_from_stdin() {
    let (_dir, kb) = fixture();
    let request = r#"{
        "text": "Paris is the capital of France",
        "language": "en",
        "mentions": [{ "raw_text": "Paris", "start": 0, "end": 5 }],
        "target_languages": ["de"]
    }"#;
    entlink()
        .args(["link", "--format", "jsonl", "--kb"])
        .arg(&kb)
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""resolved_id":22989"#))
        .stdout(predicate::str::contains(r#""translations":{"de":"Paris"}"#));
}

#[test]
fn link_tsv_output() {
    let (_dir, kb) = fixture();
    entlink()
        .args(["link", "-f", "tsv", "--kb"])
        .arg(&kb)
        .args(["-t", "Paris", "-m", "Paris:0:5", "-l", "en"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Paris\t0\t5\t22989\tParis\t"));
}

#[test]
fn unknown_language_fails() {
    let (_dir, kb) = fixture();
    entlink()
        .args(["link", "--kb"])
        .arg(&kb)
        .args(["-t", "Paris", "-m", "Paris:0:5", "-l", "de"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No knowledge base loaded"));
}

#[test]
fn malformed_mention_fails() {
    let (_dir, kb) = fixture();
    entlink()
        .args(["link", "--kb"])
        .arg(&kb)
        .args(["-t", "Paris", "-m", "Paris"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid mention"));
}

#[test]
fn missing_kb_file_fails() {
    entlink()
        .args(["link", "--kb", "/nonexistent/en.json", "-t", "x", "-m", "x:0:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load knowledge base"));
}

// =============================================================================
// terms
// =============================================================================

#[test]
fn terms_keep_order_and_scores() {
    let (_dir, kb) = fixture();
    let request = r#"{
        "language": "en",
        "text": "A trip to Paris, the capital of France.",
        "terms": [
            { "term": "Paris", "score": 0.8 },
            { "term": "zzzz", "score": 0.1 },
            { "term": "France", "score": 0.5 }
        ]
    }"#;
    let output = entlink()
        .args(["terms", "--kb"])
        .arg(&kb)
        .write_stdin(request)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["term"], "Paris");
    assert_eq!(results[0]["entities"][0]["resolved_id"], 22989);
    assert_eq!(results[1]["entities"].as_array().unwrap().len(), 0);
    assert_eq!(results[2]["score"], 0.5);
}

// =============================================================================
// config and completions
// =============================================================================

#[test]
fn config_show_prints_defaults() {
    entlink()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_senses = 5"));
}

#[test]
fn config_show_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entlink.toml");
    fs::write(&path, "max_senses = 2\n\n[languages.en]\nmin_selector_score = 0.3\n").unwrap();
    entlink()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("max_senses = 2"))
        .stdout(predicate::str::contains("min_selector_score = 0.3"));
}

#[test]
fn invalid_config_fails() {
    let (dir, kb) = fixture();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "max_senses = \"many\"\n").unwrap();
    entlink()
        .args(["link", "--kb"])
        .arg(&kb)
        .arg("--config")
        .arg(&path)
        .args(["-t", "Paris", "-m", "Paris:0:5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn completions_generate() {
    entlink()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entlink"));
}
