//! OpenAI-compatible text completions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use doki_core::backend::TextGenerator;
use doki_core::config::GenerationConfig;
use doki_core::error::{DokiError, Result};
use doki_core::types::GenerationParams;

/// Client for `POST {base_url}/v1/completions`.
pub struct CompletionsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    params: GenerationParams,
}

impl CompletionsClient {
    pub fn new(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: crate::http_client(config.timeout_secs)?,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            params: config.params(),
        })
    }

    /// Build from config, reading the key from `config.api_key_env`.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let key = crate::read_key(&config.api_key_env)?;
        Self::new(config, key)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            prompt,
            params: &self.params,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(flatten)]
    params: &'a GenerationParams,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// Extract the first candidate from a completions response body.
/// `Ok(None)` when the response holds no choices.
pub fn parse_completion(body: &str) -> Result<Option<String>> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| DokiError::Generation(format!("Failed to parse response: {e}")))?;
    Ok(response.choices.into_iter().next().map(|c| c.text))
}

#[async_trait]
impl TextGenerator for CompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/v1/completions", self.base_url);
        debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| DokiError::Generation(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DokiError::Generation(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(DokiError::Generation(format!(
                "Completions API error ({}): {}",
                status, body
            )));
        }

        parse_completion(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"id":"cmpl-1","choices":[{"text":"\n\nHi there","index":0},{"text":"other","index":1}]}"#;
        assert_eq!(parse_completion(body).unwrap(), Some("\n\nHi there".to_string()));
    }

    #[test]
    fn test_parse_no_choices() {
        assert_eq!(parse_completion(r#"{"choices":[]}"#).unwrap(), None);
        assert_eq!(parse_completion(r#"{"id":"x"}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, DokiError::Generation(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let client = CompletionsClient::new(&GenerationConfig::default(), "sk-test").unwrap();
        let body = serde_json::to_value(client.request_body("Hello")).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo-instruct");
        assert_eq!(body["prompt"], "Hello");
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["n"], 1);
        assert!(body["stop"].is_null());
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["top_p"], 1.0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = GenerationConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..GenerationConfig::default()
        };
        let client = CompletionsClient::new(&config, "k").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
