//! Cloud AI clients for the archviz viewer.
//!
//! Two HTTP collaborators, both treated as opaque services:
//! - chat-completion animation-script generation ([`animation`])
//! - image-to-image stylization of viewport captures ([`stylize`])
//!
//! Credentials come from the environment via [`AiConfig`]; nothing here
//! depends on the engine, so script parsing is testable in isolation.

use serde::Serialize;
use thiserror::Error;

pub mod animation;
pub mod config;
pub mod stylize;

pub use animation::{AnimationScript, AnimationScriptClient, ScriptAction, ScriptStep};
pub use config::AiConfig;
pub use stylize::{StylizeClient, StylizedRender};

#[derive(Debug, Error)]
pub enum AiError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Chat roles understood by the completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}
