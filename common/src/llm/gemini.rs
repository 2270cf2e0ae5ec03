use crate::config::Settings;
use crate::error::{IntelliSqlError, Result};
use crate::llm::model::TextGenerator;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const QUOTA_STATUS: &str = "RESOURCE_EXHAUSTED";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(IntelliSqlError::Generation(
                "model returned no text".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Map a non-success response to the error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> IntelliSqlError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let quota = status == StatusCode::TOO_MANY_REQUESTS
        || parsed
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .is_some_and(|s| s == QUOTA_STATUS);
    if quota {
        return IntelliSqlError::QuotaExceeded;
    }

    match parsed {
        Some(envelope) if !envelope.error.message.is_empty() => {
            IntelliSqlError::Generation(envelope.error.message)
        }
        _ => {
            let body = body.trim();
            let truncated: String = body.chars().take(200).collect();
            IntelliSqlError::Generation(format!("HTTP {}: {}", status, truncated))
        }
    }
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    http: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key().ok().map(str::to_string),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(skip(self, prompt), fields(llm.model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| IntelliSqlError::Config("API_KEY is not configured".to_string()))?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            tracing::warn!(%status, "generation request failed: {}", err);
            return Err(err);
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        let text = parsed.into_text()?;
        tracing::debug!("generated {} chars", text.len());
        Ok(text)
    }
}
