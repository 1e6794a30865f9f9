//! Trait definitions for the external collaborators of a battery.
//!
//! These async traits are implemented by the `focuskit-providers` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::AggregateResult;

// ---------------------------------------------------------------------------
// Analysis provider trait
// ---------------------------------------------------------------------------

/// A service that turns finished battery results into a narrative report.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Produce the narrative for a finalized aggregate.
    async fn analyze(&self, results: &AggregateResult) -> anyhow::Result<AnalysisResponse>;
}

/// Narrative returned by an analysis provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Markdown narrative.
    pub analysis: String,
    /// Model or service that produced it.
    #[serde(default)]
    pub model: String,
    /// Round-trip latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Speech analyzer trait
// ---------------------------------------------------------------------------

/// A service that describes a recorded voice sample.
#[async_trait]
pub trait SpeechAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Analyze raw audio bytes. The returned text is stored verbatim.
    async fn analyze_audio(&self, audio: &[u8]) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// Markdown fence unwrapping
// ---------------------------------------------------------------------------

/// Strip a single surrounding ```markdown (or bare ```) fence that models
/// sometimes wrap their whole answer in.
///
/// Text with no such fence, or with fences only in the middle, is returned
/// trimmed but otherwise untouched. An unclosed opening fence is dropped.
pub fn unwrap_markdown_fence(response: &str) -> String {
    let trimmed = response.trim();
    let Some(first_line_end) = trimmed.find('\n') else {
        return trimmed.to_string();
    };

    let opening = trimmed[..first_line_end].trim();
    if !opening.starts_with("```") {
        return trimmed.to_string();
    }
    let lang = opening.trim_start_matches('`').trim().to_lowercase();
    if !(lang.is_empty() || lang == "markdown" || lang == "md") {
        return trimmed.to_string();
    }

    let body = &trimmed[first_line_end + 1..];
    let body = match body.trim_end().strip_suffix("```") {
        Some(inner) => inner,
        // Truncated response: keep everything after the opening fence.
        None => body,
    };
    body.trim().to_string()
}
