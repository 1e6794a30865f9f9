//! The `focuskit analyze` command: request a narrative for saved results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use focuskit_core::model::AggregateResult;
use focuskit_core::report::SessionReport;
use focuskit_core::requestor::ReportRequestor;
use focuskit_providers::load_config_from;

use super::{print_summary, select_provider};

pub async fn execute(
    results_path: PathBuf,
    output: Option<PathBuf>,
    provider_name: Option<String>,
    offline: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = select_provider(&config, provider_name.as_deref(), offline)?;

    let (results, duration_ms) = load_results(&results_path)?;

    let mut requestor = ReportRequestor::new(provider.clone(), config.retry_policy());
    let outcome = requestor.request(&results).await;

    let report = SessionReport::new(results, duration_ms).with_outcome(&outcome, provider.name());
    print_summary(&report);

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("\nSession saved to: {}", path.display());
    }

    Ok(())
}

/// Accepts either a saved session report or a bare aggregate result.
fn load_results(path: &Path) -> Result<(AggregateResult, u64)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read results: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse results: {}", path.display()))?;

    if value.get("results").is_some() {
        let report: SessionReport = serde_json::from_value(value)
            .with_context(|| format!("invalid session report: {}", path.display()))?;
        Ok((report.results, report.duration_ms))
    } else {
        let results: AggregateResult = serde_json::from_value(value)
            .with_context(|| format!("invalid aggregate result: {}", path.display()))?;
        Ok((results, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_bare_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(
            &path,
            r#"{
                "hyperactivityScore": 15,
                "reactionTimes": [410, 430],
                "avgReactionTime": 420.0,
                "attentionHits": 10,
                "attentionMisses": 5,
                "attentionFalseClicks": 1,
                "memoryScore": 3,
                "stroopScore": 80.0,
                "timeDiffSeconds": -1.5
            }"#,
        )
        .unwrap();

        let (results, duration_ms) = load_results(&path).unwrap();
        assert_eq!(results.hyperactivity_score, 15);
        assert_eq!(results.reaction_times, vec![410, 430]);
        assert_eq!(duration_ms, 0);
    }

    #[test]
    fn loads_session_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let report = SessionReport::new(
            AggregateResult {
                memory_score: 6,
                ..Default::default()
            },
            120_000,
        );
        report.save_json(&path).unwrap();

        let (results, duration_ms) = load_results(&path).unwrap();
        assert_eq!(results.memory_score, 6);
        assert_eq!(duration_ms, 120_000);
    }

    #[test]
    fn rejects_non_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        let err = load_results(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse results"));
    }
}
