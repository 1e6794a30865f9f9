//! Session report with JSON persistence and a markdown summary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::microtests::questionnaire::MAX_SCORE;
use crate::model::AggregateResult;
use crate::requestor::ReportOutcome;
use crate::scoring::{ChartScores, IndicatorSummary};

/// Everything known about one finished battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique session identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Raw aggregate, exactly as sent to the analysis service.
    pub results: AggregateResult,
    /// Chart-ready scores.
    pub chart: ChartScores,
    pub indicators: IndicatorSummary,
    /// Narrative from the analysis service, if it answered.
    #[serde(default)]
    pub narrative: Option<String>,
    /// Why the narrative is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Provider that produced the narrative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Wall-clock (or simulated) duration of the battery in milliseconds.
    pub duration_ms: u64,
}

impl SessionReport {
    pub fn new(results: AggregateResult, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            chart: ChartScores::from_results(&results),
            indicators: IndicatorSummary::evaluate(&results),
            results,
            narrative: None,
            fallback_reason: None,
            provider: None,
            duration_ms,
        }
    }

    /// Attach the analysis outcome.
    pub fn with_outcome(mut self, outcome: &ReportOutcome, provider: &str) -> Self {
        match outcome {
            ReportOutcome::Narrative(response) => {
                self.narrative = Some(response.analysis.clone());
                self.fallback_reason = None;
                self.provider = Some(provider.to_string());
            }
            ReportOutcome::Fallback { reason } => {
                self.narrative = None;
                self.fallback_reason = Some(reason.clone());
                self.provider = Some(provider.to_string());
            }
        }
        self
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown. Without a narrative the indicator
    /// interpretation stands in for it.
    pub fn to_markdown(&self) -> String {
        let r = &self.results;
        let ind = &self.indicators;
        let mark = |present: bool| if present { "yes" } else { "no" };
        let mut md = String::new();

        md.push_str("### Results\n\n");
        md.push_str("| Test | Result | Indicator |\n");
        md.push_str("|------|--------|-----------|\n");
        md.push_str(&format!(
            "| Questionnaire | {} / {} | {} |\n",
            r.hyperactivity_score,
            MAX_SCORE,
            mark(ind.questionnaire)
        ));
        md.push_str(&format!(
            "| Reaction time | {:.0} ms average | {} |\n",
            r.avg_reaction_time,
            mark(ind.reaction_time)
        ));
        md.push_str(&format!(
            "| Attention | {} hits, {} misses, {} false clicks | {} |\n",
            r.attention_hits,
            r.attention_misses,
            r.attention_false_clicks,
            mark(ind.attention)
        ));
        md.push_str(&format!(
            "| Sequence memory | level {} | {} |\n",
            r.memory_score,
            mark(ind.memory)
        ));
        md.push_str(&format!("| Stroop | {:.0}% correct | - |\n", r.stroop_score));
        md.push_str(&format!(
            "| Time production | {:+.2} s off target | - |\n",
            r.time_diff_seconds
        ));
        md.push('\n');

        md.push_str("### Scores\n\n");
        md.push_str("| Focus | Memory | Inhibition | Time |\n");
        md.push_str("|-------|--------|------------|------|\n");
        md.push_str(&format!(
            "| {:.0} | {:.0} | {:.0} | {:.0} |\n\n",
            self.chart.focus, self.chart.memory, self.chart.inhibition, self.chart.time
        ));

        md.push_str(&format!(
            "**Pattern:** {} ({} of 4 indicators)\n\n",
            ind.level, ind.count
        ));

        match &self.narrative {
            Some(narrative) => {
                md.push_str("### Analysis\n\n");
                md.push_str(narrative);
                md.push('\n');
            }
            None => {
                md.push_str(ind.level.interpretation());
                md.push('\n');
            }
        }

        if let Some(audio) = &r.audio_analysis {
            md.push_str("\n### Voice sample\n\n");
            md.push_str(audio);
            md.push('\n');
        }

        md
    }
}
