//! Report requestor: hands the finished aggregate to an analysis provider.
//!
//! The battery yields its report request once; the requestor sends it,
//! retrying transient provider failures with exponential backoff. A final
//! failure turns into a user-visible fallback message. The loading state is
//! cleared on every path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::Battery;
use crate::error::ProviderError;
use crate::model::AggregateResult;
use crate::traits::{AnalysisProvider, AnalysisResponse};

/// Shown in place of the narrative when the analysis service fails.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, there was an error getting your analysis. Please try again later.";

/// Backoff settings for analysis requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What the user gets to see at the end of the battery.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Narrative(AnalysisResponse),
    Fallback { reason: String },
}

impl ReportOutcome {
    /// The text to display: the narrative, or the fallback message.
    pub fn text(&self) -> &str {
        match self {
            ReportOutcome::Narrative(response) => &response.analysis,
            ReportOutcome::Fallback { .. } => FALLBACK_MESSAGE,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ReportOutcome::Fallback { .. })
    }
}

pub struct ReportRequestor {
    provider: Arc<dyn AnalysisProvider>,
    policy: RetryPolicy,
    state: ReportState,
}

impl ReportRequestor {
    pub fn new(provider: Arc<dyn AnalysisProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            state: ReportState::Idle,
        }
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ReportState::Loading
    }

    /// Send the battery's report request if it has not been sent yet.
    /// Returns `None` when there is nothing to send (not at the report step,
    /// or already sent).
    pub async fn deliver(&mut self, battery: &mut Battery) -> Option<ReportOutcome> {
        let results = battery.take_report_request()?;
        Some(self.request(&results).await)
    }

    /// Request a narrative for `results` regardless of battery state.
    ///
    /// Dropping the returned future mid-request leaves the state `Failed`.
    pub async fn request(&mut self, results: &AggregateResult) -> ReportOutcome {
        let loading = LoadingGuard::enter(&mut self.state);
        let outcome =
            match analyze_with_retry(self.provider.as_ref(), results, &self.policy).await {
                Ok(response) => {
                    tracing::info!(
                        provider = self.provider.name(),
                        latency_ms = response.latency_ms,
                        "analysis received"
                    );
                    ReportOutcome::Narrative(response)
                }
                Err(e) => {
                    tracing::warn!(provider = self.provider.name(), "analysis failed: {e:#}");
                    ReportOutcome::Fallback {
                        reason: format!("{e:#}"),
                    }
                }
            };
        loading.finish(if outcome.is_fallback() {
            ReportState::Failed
        } else {
            ReportState::Ready
        });
        outcome
    }
}

/// Holds the state at `Loading` until finished or dropped.
struct LoadingGuard<'a> {
    state: &'a mut ReportState,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a mut ReportState) -> Self {
        *state = ReportState::Loading;
        Self { state }
    }

    fn finish(self, state: ReportState) {
        *self.state = state;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if *self.state == ReportState::Loading {
            tracing::debug!("analysis request abandoned");
            *self.state = ReportState::Failed;
        }
    }
}

/// Call the provider, retrying transient errors with exponential backoff.
pub async fn analyze_with_retry(
    provider: &dyn AnalysisProvider,
    results: &AggregateResult,
    policy: &RetryPolicy,
) -> anyhow::Result<AnalysisResponse> {
    let start = Instant::now();
    let mut delay = policy.initial_delay;
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying analysis");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(policy.max_delay);
        }
        match provider.analyze(results).await {
            Ok(mut response) => {
                if response.latency_ms == 0 {
                    response.latency_ms = start.elapsed().as_millis() as u64;
                }
                return Ok(response);
            }
            Err(e) => {
                if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                    if provider_error.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = provider_error.retry_after_ms() {
                        delay = Duration::from_millis(ms).min(policy.max_delay);
                    }
                }
                tracing::warn!(attempt, "analysis attempt failed: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no analysis attempt was made")))
}
