//! Image-to-image stylization of viewport captures.
//!
//! Posts the current frame (PNG, base64) plus a prompt to an image-synthesis
//! endpoint. The service answers either with direct results or with an async
//! task envelope; both are handled. As with script generation, a malformed
//! response body degrades to `None` instead of an error.

use base64::Engine as _;
use serde_json::Value;
use tracing::warn;

use crate::config::build_http;
use crate::{AiConfig, AiError};

/// Encode raw image bytes the way the synthesis endpoint expects them.
pub fn encode_image_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Result of a stylization call: zero or more image references (URLs or
/// inline base64) and, for async task envelopes, the task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylizedRender {
    pub task_id: Option<String>,
    pub images: Vec<String>,
}

pub struct StylizeClient {
    config: AiConfig,
    http: reqwest::Client,
}

impl StylizeClient {
    pub fn new(config: AiConfig) -> Self {
        let http = build_http(config.timeout);
        Self { config, http }
    }

    fn build_request_body(&self, png_base64: &str, prompt: &str) -> Value {
        serde_json::json!({
            "model": self.config.image_model,
            "input": {
                "image": format!("data:image/png;base64,{png_base64}"),
                "prompt": prompt,
            },
            "parameters": {
                "size": "1024*1024",
                "n": 1,
            },
        })
    }

    /// Submit a capture for stylized re-rendering.
    pub async fn stylize(
        &self,
        png_base64: &str,
        prompt: &str,
    ) -> Result<Option<StylizedRender>, AiError> {
        let key = self
            .config
            .image_api_key
            .as_deref()
            .ok_or(AiError::MissingCredential("image api key"))?;

        let response = self
            .http
            .post(&self.config.image_endpoint)
            .bearer_auth(key)
            .header("X-DashScope-Async", "enable")
            .json(&self.build_request_body(png_base64, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let data: Value = response.json().await?;
        Ok(parse_render_response(&data))
    }
}

/// Pull image references out of a synthesis response, tolerating both the
/// direct-result and async-task envelope shapes.
pub fn parse_render_response(data: &Value) -> Option<StylizedRender> {
    let output = data.get("output")?;
    let task_id = output
        .get("task_id")
        .and_then(Value::as_str)
        .map(String::from);
    let images: Vec<String> = output
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|result| {
                    result
                        .get("url")
                        .or_else(|| result.get("b64_image"))
                        .and_then(Value::as_str)
                        .map(String::from)
                })
                .collect()
        })
        .unwrap_or_default();

    if task_id.is_none() && images.is_empty() {
        warn!("stylization response carried neither results nor a task id");
        return None;
    }
    Some(StylizedRender { task_id, images })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direct_results() {
        let data = serde_json::json!({
            "output": {
                "results": [
                    {"url": "https://cdn.example.com/render-1.png"},
                    {"b64_image": "aGVsbG8="},
                ]
            }
        });
        let render = parse_render_response(&data).unwrap();
        assert_eq!(render.task_id, None);
        assert_eq!(render.images.len(), 2);
        assert_eq!(render.images[0], "https://cdn.example.com/render-1.png");
    }

    #[test]
    fn parses_async_task_envelope() {
        let data = serde_json::json!({
            "output": {"task_id": "task-123", "task_status": "PENDING"}
        });
        let render = parse_render_response(&data).unwrap();
        assert_eq!(render.task_id.as_deref(), Some("task-123"));
        assert!(render.images.is_empty());
    }

    #[test]
    fn garbage_returns_none() {
        assert!(parse_render_response(&serde_json::json!({"error": "nope"})).is_none());
        assert!(parse_render_response(&serde_json::json!({"output": {}})).is_none());
    }

    #[test]
    fn base64_roundtrip_prefix() {
        assert_eq!(encode_image_base64(b"ABC"), "QUJD");
    }

    #[test]
    fn request_body_embeds_data_url() {
        let client = StylizeClient::new(AiConfig::default().with_image_key("test"));
        let body = client.build_request_body("QUJD", "watercolor facade");
        assert_eq!(body["model"], "wanx2.1-imageedit");
        assert_eq!(body["input"]["image"], "data:image/png;base64,QUJD");
        assert_eq!(body["parameters"]["n"], 1);
    }
}
