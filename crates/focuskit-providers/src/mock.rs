//! Offline analysis provider for tests and runs without network access.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use focuskit_core::model::AggregateResult;
use focuskit_core::scoring::IndicatorSummary;
use focuskit_core::traits::{AnalysisProvider, AnalysisResponse};

/// Answers every request locally.
///
/// Without a fixed response the narrative is derived from the indicator
/// summary, so offline runs still get a meaningful conclusion.
pub struct MockAnalysisProvider {
    fixed_response: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<AggregateResult>>,
}

impl MockAnalysisProvider {
    /// Narrative built from the indicator summary.
    pub fn offline() -> Self {
        Self {
            fixed_response: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always answer with `response`.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            fixed_response: Some(response.to_string()),
            ..Self::offline()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<AggregateResult> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Markdown conclusion for a set of results, worded like the remote narrative.
pub fn offline_narrative(results: &AggregateResult) -> String {
    let summary = IndicatorSummary::evaluate(results);
    format!(
        "### Final Conclusion\n\n**Result:** **{}**\n\n**Interpretation:** {}\n",
        summary.level,
        summary.level.interpretation()
    )
}

#[async_trait]
impl AnalysisProvider for MockAnalysisProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, results: &AggregateResult) -> anyhow::Result<AnalysisResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(results.clone());

        let analysis = self
            .fixed_response
            .clone()
            .unwrap_or_else(|| offline_narrative(results));

        Ok(AnalysisResponse {
            analysis,
            model: "mock".to_string(),
            latency_ms: 1,
        })
    }
}
