//! Remote analysis service: `POST {base_url}/analyze` with the aggregate.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use focuskit_core::error::ProviderError;
use focuskit_core::model::AggregateResult;
use focuskit_core::traits::{unwrap_markdown_fence, AnalysisProvider, AnalysisResponse};

use crate::http::{build_client, check_status, send_error};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Analysis service reached over plain HTTP.
pub struct RemoteProvider {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteProvider {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    analysis: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl AnalysisProvider for RemoteProvider {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, results), fields(base_url = %self.base_url))]
    async fn analyze(&self, results: &AggregateResult) -> anyhow::Result<AnalysisResponse> {
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(results)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, "/analyze").await?;

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        let analysis = match (body.analysis, body.error) {
            (Some(analysis), _) => analysis,
            (None, Some(error)) => {
                return Err(ProviderError::ApiError {
                    status: 200,
                    message: error,
                }
                .into())
            }
            (None, None) => {
                return Err(
                    ProviderError::MalformedResponse("missing `analysis` field".into()).into(),
                )
            }
        };

        Ok(AnalysisResponse {
            analysis: unwrap_markdown_fence(&analysis),
            model: "remote".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
