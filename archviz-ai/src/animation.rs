//! Natural-language animation-script generation.
//!
//! Sends the user's description to a chat-completion endpoint together with
//! a director system prompt, then extracts a JSON timeline from the reply.
//! Model output is free text, so extraction is best-effort: a reply without
//! a parsable JSON object yields `None`, never an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::build_http;
use crate::{AiConfig, AiError, ChatMessage};

pub const ANIMATION_SYSTEM_PROMPT: &str = "\
You are a professional 3D architectural visualization animation director. \
Convert the user's description of a model animation into a standardized \
animation script as strict JSON: {\"timeline\": [steps]}. Each step has an \
\"action\", a \"params\" object and a \"duration\" in seconds. Available actions:
1. setCamera: {\"mode\": \"ortho\" | \"persp\"}
2. rotateObject: {\"axis\": \"x\"|\"y\"|\"z\", \"from\": 0, \"to\": 360}
3. sectionCut: {\"axis\": \"x\"|\"y\"|\"z\", \"from\": 0, \"to\": 100}
4. applyPreset: {\"name\": \"Clay\" | \"Blueprint\" | \"Original\"}
Output must be strict JSON with no commentary.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptAxis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    Ortho,
    Persp,
}

/// One timeline action, adjacently tagged the way the prompt asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "camelCase")]
pub enum ScriptAction {
    SetCamera {
        mode: CameraMode,
    },
    RotateObject {
        axis: ScriptAxis,
        from: f32,
        to: f32,
    },
    SectionCut {
        axis: ScriptAxis,
        from: f32,
        to: f32,
    },
    ApplyPreset {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    #[serde(flatten)]
    pub action: ScriptAction,
    #[serde(default = "default_step_duration")]
    pub duration: f32,
}

fn default_step_duration() -> f32 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationScript {
    #[serde(default)]
    pub timeline: Vec<ScriptStep>,
}

impl AnimationScript {
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn total_duration(&self) -> f32 {
        self.timeline.iter().map(|step| step.duration.max(0.0)).sum()
    }
}

pub struct AnimationScriptClient {
    config: AiConfig,
    http: reqwest::Client,
}

impl AnimationScriptClient {
    pub fn new(config: AiConfig) -> Self {
        let http = build_http(config.timeout);
        Self { config, http }
    }

    fn build_request_body(&self, user_prompt: &str) -> serde_json::Value {
        let messages = vec![
            ChatMessage::system(ANIMATION_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ];
        serde_json::json!({
            "model": self.config.chat_model,
            "messages": messages,
            "temperature": 0.3,
        })
    }

    /// Generate a timeline from a natural-language prompt.
    ///
    /// `Ok(None)` means the model answered but produced no usable JSON; the
    /// caller treats that as "generation failed" without crashing.
    pub async fn generate_script(
        &self,
        user_prompt: &str,
    ) -> Result<Option<AnimationScript>, AiError> {
        let key = self
            .config
            .chat_api_key
            .as_deref()
            .ok_or(AiError::MissingCredential("chat api key"))?;

        let response = self
            .http
            .post(&self.config.chat_endpoint)
            .bearer_auth(key)
            .json(&self.build_request_body(user_prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let data: serde_json::Value = response.json().await?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();
        debug!(len = content.len(), "chat completion received");
        Ok(parse_script(content))
    }
}

/// Extract and deserialize the first JSON object found in free-text output.
pub fn parse_script(content: &str) -> Option<AnimationScript> {
    let json = extract_json_object(content)?;
    match serde_json::from_str::<AnimationScript>(json) {
        Ok(script) if !script.is_empty() => Some(script),
        Ok(_) => {
            warn!("animation script parsed but timeline is empty");
            None
        }
        Err(error) => {
            warn!(%error, "animation script parse failed");
            None
        }
    }
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT_JSON: &str = r#"{
        "timeline": [
            {"action": "setCamera", "params": {"mode": "persp"}, "duration": 1.0},
            {"action": "rotateObject", "params": {"axis": "y", "from": 0, "to": 360}, "duration": 6.0},
            {"action": "applyPreset", "params": {"name": "Clay"}}
        ]
    }"#;

    #[test]
    fn parses_json_wrapped_in_prose() {
        let content = format!("Here is your animation script:\n```json\n{SCRIPT_JSON}\n```\nEnjoy!");
        let script = parse_script(&content).expect("script should parse");
        assert_eq!(script.timeline.len(), 3);
        assert_eq!(
            script.timeline[1].action,
            ScriptAction::RotateObject {
                axis: ScriptAxis::Y,
                from: 0.0,
                to: 360.0,
            }
        );
        // Missing duration falls back to the default.
        assert_eq!(script.timeline[2].duration, 2.0);
    }

    #[test]
    fn no_braces_returns_none() {
        assert!(parse_script("I could not produce a script, sorry.").is_none());
    }

    #[test]
    fn malformed_json_returns_none() {
        assert!(parse_script("{this is not json}").is_none());
        assert!(parse_script("} backwards {").is_none());
    }

    #[test]
    fn empty_timeline_returns_none() {
        assert!(parse_script(r#"{"timeline": []}"#).is_none());
    }

    #[test]
    fn total_duration_sums_steps() {
        let script = parse_script(SCRIPT_JSON).unwrap();
        assert!((script.total_duration() - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn request_body_carries_model_and_temperature() {
        let client = AnimationScriptClient::new(AiConfig::default().with_chat_key("test"));
        let body = client.build_request_body("orbit the building once");
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
    }
}
