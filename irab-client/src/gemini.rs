use std::fmt;

use irab_core::{AnalysisError, IrabConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited{}", quota_note(.daily))]
    RateLimited { daily: bool },
    #[error("credential rejected: {0}")]
    Unauthorized(String),
    #[error("API error: {status} - {message}")]
    Api { status: StatusCode, message: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("response carried no candidate text")]
    EmptyResponse,
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn quota_note(daily: &bool) -> &'static str {
    if *daily {
        " (daily quota reached, try again tomorrow)"
    } else {
        ""
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeminiError::Timeout
        } else {
            GeminiError::Http(err)
        }
    }
}

impl From<GeminiError> for AnalysisError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Unauthorized(_) | GeminiError::Configuration(_) => {
                AnalysisError::Configuration(err.to_string())
            }
            GeminiError::Api { status, .. }
                if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND =>
            {
                AnalysisError::Configuration(err.to_string())
            }
            GeminiError::Serialization(_) | GeminiError::EmptyResponse => {
                AnalysisError::MalformedResponse(err.to_string())
            }
            GeminiError::Http(_)
            | GeminiError::Timeout
            | GeminiError::RateLimited { .. }
            | GeminiError::Api { .. } => AnalysisError::ServiceUnavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeminiError>;

/// Thin client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &IrabConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::Configuration("GEMINI_API_KEY is not set".into()));
        }
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send one prompt and return the model's text, with any surrounding
    /// markdown code fence removed. Never retries.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.0
            }
        });

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling generateContent");
        let res = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            warn!(%status, "generateContent failed");
            return Err(classify_failure(status, body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        let text = unwrap_code_fence(&text);
        if text.is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

fn classify_failure(status: StatusCode, message: String) -> GeminiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GeminiError::RateLimited {
            daily: message.contains("PerDay"),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeminiError::Unauthorized(message),
        _ => GeminiError::Api { status, message },
    }
}

/// Strip a surrounding markdown code fence (` ```json ... ``` `), if any.
pub fn unwrap_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    let body = match rest.split_once('\n') {
        Some((tag, body)) if !tag.trim_start().starts_with(['[', '{']) => body,
        _ => rest,
    };
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_json_fence() {
        let text = "```json\n[{\"role\": \"فاعل\"}]\n```";
        assert_eq!(unwrap_code_fence(text), "[{\"role\": \"فاعل\"}]");
    }

    #[test]
    fn test_unwrap_fence_tag_ignores_case() {
        assert_eq!(unwrap_code_fence("```JSON\n[1]\n```"), "[1]");
        assert_eq!(unwrap_code_fence("```Json\n[]\n```"), "[]");
    }

    #[test]
    fn test_unwrap_bare_fence() {
        assert_eq!(unwrap_code_fence("```\n[]\n```\n"), "[]");
        assert_eq!(unwrap_code_fence("```[1]```"), "[1]");
    }

    #[test]
    fn test_unfenced_text_is_trimmed_only() {
        assert_eq!(unwrap_code_fence("  [1, 2]\n"), "[1, 2]");
    }

    #[test]
    fn test_rate_limit_classification() {
        let daily = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            "Quota exceeded for GenerateRequestsPerDayPerProjectPerModel".into(),
        );
        assert!(matches!(daily, GeminiError::RateLimited { daily: true }));

        let minute = classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(matches!(minute, GeminiError::RateLimited { daily: false }));
    }

    #[test]
    fn test_error_mapping_into_analysis_error() {
        let err: AnalysisError = GeminiError::Timeout.into();
        assert!(err.is_retryable());

        let err: AnalysisError = classify_failure(StatusCode::FORBIDDEN, "bad key".into()).into();
        assert!(matches!(err, AnalysisError::Configuration(_)));

        let err: AnalysisError = GeminiError::EmptyResponse.into();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));

        let err: AnalysisError = classify_failure(StatusCode::BAD_GATEWAY, "upstream".into()).into();
        assert!(matches!(err, AnalysisError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_client_requires_credential() {
        let err = GeminiClient::new(&IrabConfig::default()).unwrap_err();
        assert!(matches!(err, GeminiError::Configuration(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = GeminiClient::new(&IrabConfig::new("very-secret")).unwrap();
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("gemini"));
        assert!(!rendered.contains("very-secret"));
    }
}
