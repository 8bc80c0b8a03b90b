use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::config::AssistantConfig;
use crate::error::CompletionError;

/// Longest error body echoed back in a [`CompletionError::Http`].
const MAX_ERROR_BODY_CHARS: usize = 300;

/// One-shot text completion: prompt in, text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Completion provider backed by a plain HTTP endpoint.
#[derive(Clone)]
pub struct HttpCompletionProvider {
    http: Client,
    endpoint: String,
    bearer: Option<SecretString>,
    model: Option<String>,
}

impl HttpCompletionProvider {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            http: Client::new(),
            endpoint: config.endpoint.clone(),
            bearer: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Authenticate with the session token when no API key is configured.
    pub fn with_session_token(mut self, token: SecretString) -> Self {
        if self.bearer.is_none() {
            self.bearer = Some(token);
        }
        self
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = CompletionRequest {
            prompt,
            model: self.model.as_deref(),
        };
        let mut builder = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Request(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(CompletionError::Http {
                status: status.as_u16(),
                message: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        extract_completion_text(content_type.as_deref(), &text)
    }
}

/// Pull the reply text out of a completion response.
///
/// JSON bodies may carry the text in `text`, `response` or `data` (either a
/// string or an object with `text`). Anything else is taken as plain text.
pub(crate) fn extract_completion_text(
    content_type: Option<&str>,
    body: &str,
) -> Result<String, CompletionError> {
    let is_json = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
    let text = if is_json {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| CompletionError::Request(format!("invalid JSON completion: {e}")))?;
        ["text", "response", "data"]
            .iter()
            .find_map(|field| match value.get(field) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Object(inner)) => inner
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .unwrap_or_default()
    } else {
        body.to_string()
    };

    if text.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text)
}
