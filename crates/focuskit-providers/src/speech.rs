//! HTTP client for the external speech-analysis service.

use async_trait::async_trait;
use tracing::instrument;

use focuskit_core::traits::SpeechAnalyzer;

use crate::http::{build_client, check_status, send_error};

const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Uploads raw audio to `POST {base_url}/analyze-audio` and returns the
/// response body as the analysis text.
pub struct HttpSpeechAnalyzer {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSpeechAnalyzer {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[async_trait]
impl SpeechAnalyzer for HttpSpeechAnalyzer {
    fn name(&self) -> &str {
        "http-speech"
    }

    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn analyze_audio(&self, audio: &[u8]) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/analyze-audio", self.base_url))
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, "/analyze-audio").await?;
        let text = response
            .text()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focuskit_core::model::Measurement;
    use focuskit_core::speech::{capture_speech, UNAVAILABLE_TEXT};
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn uploads_audio_and_returns_text_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/analyze-audio"))
            .and(header("content-type", "application/octet-stream"))
            .and(body_bytes(vec![0u8, 1, 2, 3]))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"pace\": \"steady\", \"pauses\": 2}\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let analyzer = HttpSpeechAnalyzer::new(&server.uri()).unwrap();
        let text = analyzer.analyze_audio(&[0, 1, 2, 3]).await.unwrap();
        assert_eq!(text, "{\"pace\": \"steady\", \"pauses\": 2}");
    }

    #[tokio::test]
    async fn failing_service_yields_placeholder_measurement() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let analyzer = HttpSpeechAnalyzer::new(&server.uri()).unwrap();
        let measurement = capture_speech(Some(&analyzer), Some(&[7u8, 7][..])).await;
        assert_eq!(
            measurement,
            Measurement::Speech {
                analysis: UNAVAILABLE_TEXT.to_string()
            }
        );
    }
}
