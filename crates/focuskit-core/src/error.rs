//! Error types for the battery and its external collaborators.
//!
//! `ProviderError` is defined here rather than in `focuskit-providers` so the
//! report requestor can downcast and classify errors for retry decisions
//! without string matching.

use thiserror::Error;

use crate::model::Step;

/// Misuse of the battery orchestrator or the questionnaire scorer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatteryError {
    /// `advance` was called while the step still owes its measurement.
    #[error("step {0} has not completed yet")]
    StepIncomplete(Step),

    /// `advance` was called from a step that is not the current one.
    #[error("cannot advance from {requested}: current step is {current}")]
    NotCurrentStep { requested: Step, current: Step },

    /// The battery already reached the report step.
    #[error("battery is finished")]
    Finished,

    /// The active step already produced its measurement and cannot restart.
    #[error("step {0} already completed and cannot be restarted")]
    AlreadyCompleted(Step),

    /// Questionnaire scored before every question was answered.
    #[error("questionnaire incomplete: {answered} of {total} answered")]
    IncompleteAnswers { answered: usize, total: usize },

    /// Answer value outside the 0..=4 Likert range.
    #[error("answer {value} for question {question} is outside 0..=4")]
    AnswerOutOfRange { question: usize, value: u8 },

    /// Question index that does not exist.
    #[error("unknown question index {0}")]
    UnknownQuestion(usize),

    /// A scripted run reached a state it has no input for.
    #[error("step {0} stalled: no pending timers and no scripted input")]
    Stalled(Step),
}

/// Errors that can occur when talking to the analysis or speech service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model or endpoint was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_)
                | ProviderError::NotFound(_)
                | ProviderError::MalformedResponse(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
