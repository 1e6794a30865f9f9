//! HTTP plumbing shared by the providers: client construction and mapping
//! of transport failures and status codes onto [`ProviderError`].

use std::time::Duration;

use anyhow::Context;
use focuskit_core::error::ProviderError;

pub(crate) fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

pub(crate) fn send_error(e: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// Pass successful responses through; turn everything else into a typed error.
/// `what` names the resource for 404s.
pub(crate) async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5)
            * 1000;
        return Err(ProviderError::RateLimited {
            retry_after_ms: retry_after,
        });
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        401 | 403 => Err(ProviderError::AuthenticationFailed(error_message(&body))),
        404 => Err(ProviderError::NotFound(what.to_string())),
        _ => Err(ProviderError::ApiError {
            status,
            message: error_message(&body),
        }),
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"error": "..."}` and `{"error": {"message": "..."}}`;
/// anything else is returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let error = &value["error"];
    if let Some(message) = error.as_str() {
        return message.to_string();
    }
    if let Some(message) = error["message"].as_str() {
        return message.to_string();
    }
    body.to_string()
}
