//! Remote data gateway.
//!
//! A thin JSON client for the portal backend. It attaches the bearer token,
//! sends and accepts JSON, and folds every response into either the parsed
//! body or an [`ApiError`]. It does no retries and sets no timeouts;
//! cancellation is handled by the caller's page scope.

mod endpoints;

use reqwest::{Client, Method, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use endpoints::{Envelope, LawyerSummary, Profile};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Bearer-authenticated JSON client for `<base_url><prefix>/...`.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("prefix", &self.config.prefix)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Issue a request and return the parsed JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.config.endpoint(path);
        let url = reqwest::Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %method, url = %url, "API request");
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        let result = normalize_response(status, content_type.as_deref(), &text);
        if let Err(e) = &result {
            tracing::debug!(method = %method, url = %url, status = %status, error = %e, "API request failed");
        }
        result
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        endpoints::unwrap_envelope(self.get(path).await?)
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let mime = ct
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        mime == "application/json" || mime.ends_with("+json")
    })
}

/// Fold a raw HTTP response into the gateway's uniform result.
///
/// Checked in order: content type, JSON validity, status. A non-JSON body is
/// never handed to the JSON parser. An empty success body (e.g. `204`) is
/// returned as `null`.
pub fn normalize_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<Value, ApiError> {
    let status_text = status.canonical_reason().unwrap_or_default().to_string();

    if status.is_success() && body.trim().is_empty() {
        return Ok(Value::Null);
    }

    if !is_json_content_type(content_type) {
        return Err(ApiError::NonJson {
            status: status.as_u16(),
            status_text,
            body: body.to_string(),
        });
    }

    let parsed: Value = serde_json::from_str(body).map_err(|e| ApiError::InvalidJson {
        status: status.as_u16(),
        message: e.to_string(),
    })?;

    if !status.is_success() {
        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), status_text));
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{is_json_content_type, normalize_response};
    use crate::error::ApiError;

    #[test]
    fn non_json_error_embeds_status_and_text() {
        let err = normalize_response(
            StatusCode::BAD_GATEWAY,
            Some("text/html; charset=utf-8"),
            "<html>upstream down</html>",
        )
        .expect_err("html must fail");

        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
        let ApiError::NonJson { body, .. } = err else {
            panic!("expected NonJson");
        };
        assert!(body.contains("upstream down"));
    }

    #[test]
    fn non_json_success_is_still_an_error() {
        let err = normalize_response(StatusCode::OK, Some("text/plain"), "{\"data\":1}")
            .expect_err("content type decides");
        assert!(matches!(err, ApiError::NonJson { status: 200, .. }));
    }

    #[test]
    fn missing_content_type_is_non_json() {
        let err = normalize_response(StatusCode::INTERNAL_SERVER_ERROR, None, "boom")
            .expect_err("no content type");
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn invalid_json_is_a_distinct_error() {
        let err = normalize_response(StatusCode::OK, Some("application/json"), "{\"data\":")
            .expect_err("truncated json");
        assert!(matches!(err, ApiError::InvalidJson { status: 200, .. }));
    }

    #[test]
    fn http_error_prefers_server_message() {
        let err = normalize_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("application/json"),
            r#"{"message":"Title is required"}"#,
        )
        .expect_err("422");
        assert_eq!(
            err,
            ApiError::Http {
                status: 422,
                message: "Title is required".to_string(),
            }
        );
    }

    #[test]
    fn http_error_without_message_uses_status_line() {
        let err = normalize_response(StatusCode::UNAUTHORIZED, Some("application/json"), "{}")
            .expect_err("401");
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }

    #[test]
    fn success_returns_parsed_body() {
        let value = normalize_response(
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            r#"{"data":{"name":"Ada"}}"#,
        )
        .expect("ok");
        assert_eq!(value["data"]["name"], "Ada");
    }

    #[test]
    fn empty_success_body_is_null() {
        let value = normalize_response(StatusCode::NO_CONTENT, None, "").expect("204");
        assert!(value.is_null());
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type(Some("application/json")));
        assert!(is_json_content_type(Some("Application/JSON; charset=utf-8")));
        assert!(is_json_content_type(Some("application/problem+json")));
        assert!(!is_json_content_type(Some("text/json-ish")));
        assert!(!is_json_content_type(None));
    }
}
