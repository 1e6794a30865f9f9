//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A command isolated from the caller's config files and keys.
fn focuskit(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("focuskit").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("FOCUSKIT_GEMINI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn session_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    focuskit(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cognitive test battery"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    focuskit(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("focuskit"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created focuskit.toml"));

    assert!(dir.path().join("focuskit.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path()).arg("init").assert().success();

    focuskit(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn simulate_steady_offline_saves_report() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("sessions");

    focuskit(dir.path())
        .args(["simulate", "--offline", "--seed", "7", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pattern: Low Correlation"))
        .stdout(predicate::str::contains("**Result:** **Low Correlation**"))
        .stderr(predicate::str::contains("Session saved to:"));

    let files = session_files(&out);
    assert_eq!(files.len(), 1);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(saved["results"]["hyperactivityScore"], 6);
    assert_eq!(saved["results"]["memoryScore"], 7);
    assert_eq!(saved["provider"], "mock");
    assert!(saved["narrative"].is_string());
}

#[test]
fn simulate_distracted_shows_strong_pattern() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .args(["simulate", "--offline", "--profile", "distracted", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Strong Correlation"));

    // Without --output the report lands in the configured default directory.
    assert_eq!(session_files(&dir.path().join("focuskit-sessions")).len(), 1);
}

#[test]
fn simulate_transcript_lists_cues() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .args(["simulate", "--offline", "--seed", "3", "--transcript"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== Reaction time =="))
        .stdout(predicate::str::contains("GO!"))
        .stdout(predicate::str::contains("Stroop complete."));
}

#[test]
fn simulate_rejects_unknown_profile() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .args(["simulate", "--profile", "sleepy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown profile"));
}

#[test]
fn simulate_without_configured_provider_fails() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .arg("simulate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'gemini' is not configured"));
}

#[test]
fn analyze_with_configured_mock_response() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("focuskit.toml"),
        r####"
default_provider = "canned"

[providers.canned]
type = "mock"
response = "### Final Conclusion\n\nAll clear."
"####,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("results.json"),
        r#"{
            "hyperactivityScore": 16,
            "reactionTimes": [450, 470],
            "avgReactionTime": 460.0,
            "attentionHits": 8,
            "attentionMisses": 6,
            "attentionFalseClicks": 2,
            "memoryScore": 5,
            "stroopScore": 60.0,
            "timeDiffSeconds": 1.0
        }"#,
    )
    .unwrap();

    focuskit(dir.path())
        .args(["analyze", "--results", "results.json", "--output", "report.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All clear."))
        .stdout(predicate::str::contains("Strong Correlation (3 of 4 indicators)"));

    let saved: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["provider"], "mock");
    assert_eq!(saved["results"]["attentionMisses"], 6);
}

#[test]
fn analyze_missing_file() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .args(["analyze", "--offline", "--results", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read results"));
}

#[tokio::test(flavor = "multi_thread")]
async fn analyze_falls_back_when_service_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "Failed to get analysis from AI model."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("focuskit.toml"),
        format!(
            "default_provider = \"remote\"\nmax_retries = 0\n\n[providers.remote]\ntype = \"remote\"\nbase_url = \"{}\"\n",
            server.uri()
        ),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("results.json"),
        r#"{"hyperactivityScore": 4, "reactionTimes": [], "avgReactionTime": 0.0,
            "attentionHits": 0, "attentionMisses": 0, "attentionFalseClicks": 0,
            "memoryScore": 6, "stroopScore": 100.0, "timeDiffSeconds": 0.0}"#,
    )
    .unwrap();

    focuskit(dir.path())
        .args(["analyze", "--results", "results.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Sorry, there was an error getting your analysis. Please try again later.",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn models_lists_generate_content_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {
                    "name": "models/gemini-1.5-flash",
                    "displayName": "Gemini 1.5 Flash",
                    "description": "Fast multimodal model",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {
                    "name": "models/text-embedding-004",
                    "displayName": "Text Embedding 004",
                    "description": "Embeddings",
                    "supportedGenerationMethods": ["embedContent"]
                }
            ]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("focuskit.toml"),
        format!(
            "[providers.gemini]\ntype = \"gemini\"\napi_key = \"test-key\"\nbase_url = \"{}\"\n",
            server.uri()
        ),
    )
    .unwrap();

    focuskit(dir.path())
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-1.5-flash (configured)"))
        .stdout(predicate::str::contains("Gemini 1.5 Flash"))
        .stdout(predicate::str::contains("text-embedding-004").not());
}

#[test]
fn models_without_gemini_config() {
    let dir = TempDir::new().unwrap();

    focuskit(dir.path())
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("No Gemini provider configured"));
}
