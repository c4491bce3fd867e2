//! Google Cloud Vision label detection.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use doki_core::backend::{join_labels, ImageLabeler};
use doki_core::config::VisionConfig;
use doki_core::error::{DokiError, Result};

/// Client for `POST {endpoint}/v1/images:annotate`.
pub struct VisionLabeler {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl VisionLabeler {
    pub fn new(config: &VisionConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: crate::http_client(config.timeout_secs)?,
            api_key: api_key.into(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &VisionConfig) -> Result<Self> {
        let key = crate::read_key(&config.api_key_env)?;
        Self::new(config, key)
    }
}

/// Request body asking for label detection on one image.
fn annotate_body(image: &[u8]) -> Value {
    json!({
        "requests": [{
            "image": { "content": BASE64_STANDARD.encode(image) },
            "features": [{ "type": "LABEL_DETECTION" }]
        }]
    })
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Extract the comma-joined label descriptions from an annotate response.
/// An image with no labels yields an empty string.
pub fn parse_labels(body: &str) -> Result<String> {
    let response: AnnotateResponse = serde_json::from_str(body)
        .map_err(|e| DokiError::ImageLabeling(format!("Failed to parse response: {e}")))?;

    let Some(first) = response.responses.into_iter().next() else {
        return Ok(String::new());
    };
    if let Some(status) = first.error {
        return Err(DokiError::ImageLabeling(format!(
            "Vision API error ({}): {}",
            status.code, status.message
        )));
    }

    Ok(join_labels(
        first.label_annotations.iter().map(|l| l.description.as_str()),
    ))
}

#[async_trait]
impl ImageLabeler for VisionLabeler {
    async fn label(&self, image: &[u8]) -> Result<String> {
        let url = format!("{}/v1/images:annotate", self.endpoint);
        debug!(image_bytes = image.len(), "Requesting label detection");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&annotate_body(image))
            .send()
            .await
            .map_err(|e| DokiError::ImageLabeling(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DokiError::ImageLabeling(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(DokiError::ImageLabeling(format!(
                "Vision API error ({}): {}",
                status, body
            )));
        }

        parse_labels(&body)
    }
}
