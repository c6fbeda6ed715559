//! Streaming speech synthesis through the Play.ht v2 API.
//!
//! The endpoint streams raw audio back as it is generated; chunks are handed
//! to the caller in arrival order and never inspected here.

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::SpeechConfig;

/// Ordered audio chunks as they arrive off the wire.
pub type AudioChunkStream = BoxStream<'static, anyhow::Result<Vec<u8>>>;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> anyhow::Result<AudioChunkStream>;
}

pub struct PlayHtSynthesizer {
    config: SpeechConfig,
    api_key: String,
    user_id: String,
    client: Client,
}

impl PlayHtSynthesizer {
    pub fn new(config: SpeechConfig, api_key: &str, user_id: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            api_key: api_key.to_string(),
            user_id: user_id.to_string(),
            client,
        }
    }
}

fn request_body(config: &SpeechConfig, text: &str) -> serde_json::Value {
    json!({
        "text": text,
        "voice": config.voice,
        "output_format": "wav",
        "voice_guidance": config.voice_guidance,
        "text_guidance": config.text_guidance,
        "speed": config.speed,
        "sample_rate": config.sample_rate,
    })
}

#[async_trait]
impl SpeechSynthesizer for PlayHtSynthesizer {
    async fn synthesize(&self, text: &str) -> anyhow::Result<AudioChunkStream> {
        debug!("Synthesizing {} chars at {} Hz", text.len(), self.config.sample_rate);

        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("AUTHORIZATION", &self.api_key)
            .header("X-USER-ID", &self.user_id)
            .header("Accept", "audio/wav")
            .json(&request_body(&self.config, text))
            .send()
            .await
            .context("speech synthesis request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("speech synthesis returned status {status}");
        }

        let chunks = resp
            .bytes_stream()
            .map_ok(|bytes| bytes.to_vec())
            .map_err(anyhow::Error::from);
        Ok(chunks.boxed())
    }
}
