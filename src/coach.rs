//! Coach message generation through a chat-completion model.
//!
//! One system-role instruction per window change, no conversation state.
//! Failures propagate to the pipeline, which substitutes the fallback line.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::CoachConfig;

const COACH_PROMPT: &str = r#"Act as a productivity military coach.
You are strict, ironic, sarcastic with the user and will go to extreme lengths to encourage them to work.
Give max ONE SENTENCE SHORT replies only.
Make it like a game's mission.
User's current window is: {current} and last windows are: {history}.
Carefully read and understand the current window, if it is social media like youtube or x.com then SCREAM at them to motivate them to focus on productive work.
Otherwise, encourage and compliment them like an army sergeant.
Add excess of punctuation to clearly indicate audio tone, your output will be used for text-to-speech."#;

/// Spoken when message generation fails for any reason.
pub const FALLBACK_MESSAGE: &str =
    "Soldier, we're experiencing technical difficulties. Stay focused!";

#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, current: &str, history: &[String]) -> anyhow::Result<String>;
}

/// Render the coach instruction for one window change.
///
/// Titles go in verbatim; the model sees exactly what the window manager
/// reported.
pub fn build_prompt(current: &str, history: &[String]) -> String {
    COACH_PROMPT
        .replace("{current}", current)
        .replace("{history}", &format!("{history:?}"))
}

pub struct OpenAiGenerator {
    config: CoachConfig,
    api_key: String,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(config: CoachConfig, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            api_key: api_key.to_string(),
            client,
        }
    }
}

#[async_trait]
impl MessageGenerator for OpenAiGenerator {
    async fn generate(&self, current: &str, history: &[String]) -> anyhow::Result<String> {
        let prompt = build_prompt(current, history);
        debug!("Requesting coach line from '{}' for '{current}'", self.config.model);

        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "system", "content": prompt}],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let url = join_url(&self.config.api_base, "/chat/completions");
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("chat completion returned status {status}");
        }

        let bytes = resp.bytes().await.context("read chat completion body")?;
        let message = parse_chat_completion(&bytes)?;
        let message = message.trim().to_string();
        if message.is_empty() {
            bail!("chat completion returned empty content");
        }
        Ok(message)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn parse_chat_completion(body: &[u8]) -> anyhow::Result<String> {
    let resp: ChatResponse =
        serde_json::from_slice(body).context("decode chat completion JSON")?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("no content in chat completion response"))
}
