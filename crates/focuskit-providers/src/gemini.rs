//! Google Gemini provider.
//!
//! Builds the analysis prompt locally from the results and the indicator
//! summary, then asks the model to format it.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use focuskit_core::error::ProviderError;
use focuskit_core::microtests::questionnaire::MAX_SCORE;
use focuskit_core::model::{AggregateResult, BatteryConfig};
use focuskit_core::scoring::{
    IndicatorSummary, ATTENTION_ERROR_THRESHOLD, MEMORY_THRESHOLD, QUESTIONNAIRE_THRESHOLD,
    REACTION_THRESHOLD_MS,
};
use focuskit_core::traits::{unwrap_markdown_fence, AnalysisProvider, AnalysisResponse};

use crate::http::{build_client, check_status, send_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    time_target_secs: f64,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            time_target_secs: BatteryConfig::default().time_target_secs,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// The interval the time production test asked the user to hold.
    pub fn with_time_target(mut self, secs: f64) -> Self {
        self.time_target_secs = secs;
        self
    }

    /// Models available to this key that support `generateContent`.
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, "models").await?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| ModelInfo {
                id: m.name.trim_start_matches("models/").to_string(),
                display_name: m.display_name,
                description: m.description,
            })
            .collect())
    }
}

/// A model that can generate analyses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ApiModel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiModel {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// The full analysis prompt for a set of results.
pub fn build_prompt(results: &AggregateResult, time_target_secs: f64) -> String {
    let summary = IndicatorSummary::evaluate(results);
    let mut prompt = String::new();

    prompt.push_str(
        "You are an assistant that explains the results of a short set of attention and memory tests.\n\n",
    );
    prompt.push_str(
        "Rule: do not diagnose the user. Never say that the user has or does not have any condition. \
         Describe patterns only.\n\n",
    );

    prompt.push_str("User results:\n");
    prompt.push_str(&format!(
        "- Questionnaire score: {} of {} (above {} is an indicator){}\n",
        results.hyperactivity_score,
        MAX_SCORE,
        QUESTIONNAIRE_THRESHOLD,
        flag(summary.questionnaire)
    ));
    prompt.push_str(&format!(
        "- Average reaction time: {:.0} ms (above {:.0} ms is an indicator){}\n",
        results.avg_reaction_time,
        REACTION_THRESHOLD_MS,
        flag(summary.reaction_time)
    ));
    prompt.push_str(&format!(
        "- Attention test: {} misses, {} false clicks (more than {} of either is an indicator){}\n",
        results.attention_misses,
        results.attention_false_clicks,
        ATTENTION_ERROR_THRESHOLD,
        flag(summary.attention)
    ));
    prompt.push_str(&format!(
        "- Visual memory: reached level {} (below {} is an indicator){}\n",
        results.memory_score,
        MEMORY_THRESHOLD,
        flag(summary.memory)
    ));
    prompt.push_str(&format!("- Stroop accuracy: {:.0}%\n", results.stroop_score));
    prompt.push_str(&format!(
        "- Time production: {:+.2} s from a {} s target\n",
        results.time_diff_seconds, time_target_secs
    ));
    if let Some(audio) = &results.audio_analysis {
        prompt.push_str(&format!("- Voice sample notes: {audio}\n"));
    }

    prompt.push_str(&format!(
        "\n{} indicator(s) are present.\n\n",
        summary.count
    ));
    prompt.push_str(
        "Respond in Markdown with two parts.\n\
         1. A table with the columns \"Test Area\", \"Your Result\" and \"Brief Insight\".\n\
         2. The conclusion block below, copied exactly.\n\n",
    );
    prompt.push_str("### Final Conclusion\n\n");
    prompt.push_str(&format!("**Result:** **{}**\n\n", summary.level));
    prompt.push_str(&format!(
        "**Interpretation:** {}\n",
        summary.level.interpretation()
    ));
    prompt
}

fn flag(present: bool) -> &'static str {
    if present {
        " [indicator present]"
    } else {
        ""
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, results), fields(model = %self.model))]
    async fn analyze(&self, results: &AggregateResult) -> anyhow::Result<AnalysisResponse> {
        let start = Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(results, self.time_target_secs),
                }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, &self.model).await?;

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::MalformedResponse("no candidate text".into()).into());
        }

        Ok(AnalysisResponse {
            analysis: unwrap_markdown_fence(&text),
            model: api_response.model_version.unwrap_or_else(|| self.model.clone()),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
