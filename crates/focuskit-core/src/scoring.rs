//! Score derivation: per-test formulas, chart normalization and the
//! indicator classification used to frame the narrative report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AggregateResult, Millis};

/// Arithmetic mean of reaction samples; 0 for an empty slice.
pub fn mean(values: &[Millis]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Population standard deviation in ms. 0 with fewer than two samples.
pub fn variability(values: &[Millis]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Percentage of correct Stroop answers.
pub fn stroop_score(correct: u32, trials: u32) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    correct as f64 * 100.0 / trials as f64
}

/// Signed error of a produced interval, in seconds.
pub fn time_diff(duration_secs: f64, target_secs: f64) -> f64 {
    duration_secs - target_secs
}

/// Chart-ready 0..=100 scores handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartScores {
    pub focus: f64,
    pub memory: f64,
    pub inhibition: f64,
    pub time: f64,
}

impl ChartScores {
    pub fn from_results(results: &AggregateResult) -> Self {
        let focus = (100.0 - variability(&results.reaction_times) / 2.0).max(0.0);
        let memory = (results.memory_score as f64 / 10.0 * 100.0).min(100.0);
        let time = (100.0 - results.time_diff_seconds.abs() * 10.0).max(0.0);
        Self {
            focus,
            memory,
            inhibition: results.stroop_score,
            time,
        }
    }
}

/// Thresholds above (or below) which a measurement counts as an indicator.
pub const QUESTIONNAIRE_THRESHOLD: u32 = 14;
pub const REACTION_THRESHOLD_MS: f64 = 400.0;
pub const ATTENTION_ERROR_THRESHOLD: u32 = 4;
pub const MEMORY_THRESHOLD: u32 = 4;

/// How strongly the results line up with the screened trait pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationLevel {
    Low,
    Moderate,
    Strong,
}

impl CorrelationLevel {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 | 1 => CorrelationLevel::Low,
            2 => CorrelationLevel::Moderate,
            _ => CorrelationLevel::Strong,
        }
    }

    /// Plain-language reading of the level. Never phrased as a diagnosis.
    pub fn interpretation(self) -> &'static str {
        match self {
            CorrelationLevel::Low => {
                "Your results do not show a notable pattern of the traits these tests screen for. \
                 Occasional distraction or impulsivity is normal, and your performance falls within a typical range."
            }
            CorrelationLevel::Moderate => {
                "Your results are mixed. Most areas look typical, but a couple showed traits that are \
                 sometimes linked to attention difficulties. This may point to one specific area, such as \
                 impulsivity or inattention, rather than a broad pattern."
            }
            CorrelationLevel::Strong => {
                "Several areas showed traits that are often seen together in people with attention difficulties. \
                 Consider sharing these results with a doctor or mental health professional, \
                 who can provide a proper evaluation."
            }
        }
    }
}

impl fmt::Display for CorrelationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationLevel::Low => write!(f, "Low Correlation"),
            CorrelationLevel::Moderate => write!(f, "Moderate Correlation"),
            CorrelationLevel::Strong => write!(f, "Strong Correlation"),
        }
    }
}

/// Which of the four screening indicators are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub questionnaire: bool,
    pub reaction_time: bool,
    pub attention: bool,
    pub memory: bool,
    pub count: u32,
    pub level: CorrelationLevel,
}

impl IndicatorSummary {
    pub fn evaluate(results: &AggregateResult) -> Self {
        let questionnaire = results.hyperactivity_score > QUESTIONNAIRE_THRESHOLD;
        let reaction_time = results.avg_reaction_time > REACTION_THRESHOLD_MS;
        let attention = results.attention_misses > ATTENTION_ERROR_THRESHOLD
            || results.attention_false_clicks > ATTENTION_ERROR_THRESHOLD;
        let memory = results.memory_score < MEMORY_THRESHOLD;
        let count = [questionnaire, reaction_time, attention, memory]
            .iter()
            .filter(|&&present| present)
            .count() as u32;
        Self {
            questionnaire,
            reaction_time,
            attention,
            memory,
            count,
            level: CorrelationLevel::from_count(count),
        }
    }
}
