//! Endpoint and credential configuration.
//!
//! Keys are never hardcoded: they are read from the environment at startup
//! and checked at call time, so a viewer without credentials still runs —
//! the AI features just report themselves unavailable.

use std::time::Duration;

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_IMAGE_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text2image/image-synthesis";
pub const DEFAULT_IMAGE_MODEL: &str = "wanx2.1-imageedit";

/// Upper bound on any single AI request; in-flight calls are never unbounded.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub chat_endpoint: String,
    pub chat_model: String,
    pub chat_api_key: Option<String>,
    pub image_endpoint: String,
    pub image_model: String,
    pub image_api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_api_key: None,
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AiConfig {
    /// Read endpoints and bearer tokens from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ARCHVIZ_CHAT_API_URL") {
            config.chat_endpoint = url;
        }
        if let Ok(model) = std::env::var("ARCHVIZ_CHAT_MODEL") {
            config.chat_model = model;
        }
        config.chat_api_key = std::env::var("ARCHVIZ_CHAT_API_KEY").ok();

        if let Ok(url) = std::env::var("ARCHVIZ_IMAGE_API_URL") {
            config.image_endpoint = url;
        }
        if let Ok(model) = std::env::var("ARCHVIZ_IMAGE_MODEL") {
            config.image_model = model;
        }
        config.image_api_key = std::env::var("ARCHVIZ_IMAGE_API_KEY").ok();

        if let Some(secs) = std::env::var("ARCHVIZ_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_chat_key(mut self, key: impl Into<String>) -> Self {
        self.chat_api_key = Some(key.into());
        self
    }

    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.image_api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build a client with the configured timeout where the platform supports it.
pub(crate) fn build_http(timeout: Duration) -> reqwest::Client {
    #[cfg(not(target_arch = "wasm32"))]
    {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = timeout;
        reqwest::Client::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_credentials() {
        let config = AiConfig::default();
        assert!(config.chat_api_key.is_none());
        assert!(config.image_api_key.is_none());
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn builder_sets_keys() {
        let config = AiConfig::default().with_chat_key("k1").with_image_key("k2");
        assert_eq!(config.chat_api_key.as_deref(), Some("k1"));
        assert_eq!(config.image_api_key.as_deref(), Some("k2"));
    }
}
