//! The change-triggered notification pipeline: generate → synthesize → play.
//!
//! Every stage failure is absorbed here. Generation falls back to a canned
//! line, synthesis and playback failures abort the single notification, and
//! the caller always gets an outcome back, never an error.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::coach::{MessageGenerator, FALLBACK_MESSAGE};
use crate::playback::{AudioOutput, SinkSpec};
use crate::tts::SpeechSynthesizer;

// Leading silence keeps the TTS voice from clipping the first syllable.
const SPEECH_LEAD_IN: &str = "   ";

/// Where the spoken text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Model,
    Fallback,
}

/// How far a single notification got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Done,
    SynthesisFailed,
    PlaybackFailed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done => write!(f, "DONE"),
            Self::SynthesisFailed => write!(f, "SYNTH_FAILED"),
            Self::PlaybackFailed => write!(f, "PLAYBACK_FAILED"),
        }
    }
}

/// Outcome of one notification. Errors are recorded, never raised.
#[derive(Debug)]
pub struct NotificationOutcome {
    pub text: String,
    pub source: MessageSource,
    pub stage: PipelineStage,
    pub error: Option<String>,
}

impl NotificationOutcome {
    fn done(text: String, source: MessageSource) -> Self {
        Self {
            text,
            source,
            stage: PipelineStage::Done,
            error: None,
        }
    }

    fn failed(
        text: String,
        source: MessageSource,
        stage: PipelineStage,
        error: impl Into<String>,
    ) -> Self {
        Self {
            text,
            source,
            stage,
            error: Some(error.into()),
        }
    }
}

pub struct NotificationPipeline {
    generator: Arc<dyn MessageGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Box<dyn AudioOutput>,
    sink_spec: SinkSpec,
}

impl NotificationPipeline {
    pub fn new(
        generator: Arc<dyn MessageGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Box<dyn AudioOutput>,
        sample_rate: u32,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            output,
            // The synthesis stream is mono PCM at the configured rate.
            sink_spec: SinkSpec {
                channels: 1,
                sample_rate,
            },
        }
    }

    /// Speak one coach line for a window change.
    pub async fn notify(&self, current: &str, history: &[String]) -> NotificationOutcome {
        let t_start = Instant::now();

        debug!("Stage: GENERATING");
        let (text, source) = match self.generator.generate(current, history).await {
            Ok(text) => (text, MessageSource::Model),
            Err(e) => {
                warn!("Message generation failed: {e:#}");
                (FALLBACK_MESSAGE.to_string(), MessageSource::Fallback)
            }
        };

        let preview: String = text.chars().take(80).collect();
        info!(
            "Speaking: \"{}{}\"",
            preview.replace('\n', " "),
            if text.len() > 80 { "..." } else { "" },
        );
        let padded = format!("{SPEECH_LEAD_IN}{text}");

        debug!("Stage: SYNTHESIZING");
        let mut chunks = match self.synthesizer.synthesize(&padded).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Speech synthesis failed: {e:#}");
                return NotificationOutcome::failed(
                    text,
                    source,
                    PipelineStage::SynthesisFailed,
                    e.to_string(),
                );
            }
        };

        debug!("Stage: PLAYING");
        let mut sink = match self.output.open(&self.sink_spec) {
            Ok(sink) => sink,
            Err(e) => {
                warn!("Audio output unavailable: {e:#}");
                return NotificationOutcome::failed(
                    text,
                    source,
                    PipelineStage::PlaybackFailed,
                    e.to_string(),
                );
            }
        };

        // Chunks go to the sink in arrival order. Dropping the sink on any
        // error stops whatever is already queued.
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    if let Err(e) = sink.write(&bytes) {
                        warn!("Audio write failed: {e:#}");
                        return NotificationOutcome::failed(
                            text,
                            source,
                            PipelineStage::PlaybackFailed,
                            e.to_string(),
                        );
                    }
                }
                Err(e) => {
                    warn!("Synthesis stream failed mid-utterance: {e:#}");
                    return NotificationOutcome::failed(
                        text,
                        source,
                        PipelineStage::SynthesisFailed,
                        e.to_string(),
                    );
                }
            }
        }

        // Draining blocks until playback ends, so it runs off the async thread.
        match tokio::task::spawn_blocking(move || sink.finish()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Playback did not finish cleanly: {e:#}");
                return NotificationOutcome::failed(
                    text,
                    source,
                    PipelineStage::PlaybackFailed,
                    e.to_string(),
                );
            }
            Err(e) => {
                warn!("Playback task failed: {e}");
                return NotificationOutcome::failed(
                    text,
                    source,
                    PipelineStage::PlaybackFailed,
                    e.to_string(),
                );
            }
        }

        let total_ms = t_start.elapsed().as_secs_f64() * 1000.0;
        info!("Notification complete ({total_ms:.0}ms)");
        NotificationOutcome::done(text, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::AudioSink;
    use crate::tts::AudioChunkStream;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl MessageGenerator for FixedGenerator {
        async fn generate(&self, _current: &str, _history: &[String]) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl MessageGenerator for FailingGenerator {
        async fn generate(&self, _current: &str, _history: &[String]) -> anyhow::Result<String> {
            Err(anyhow!("model offline"))
        }
    }

    struct ChunkSynthesizer {
        chunks: Vec<anyhow::Result<Vec<u8>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl ChunkSynthesizer {
        fn ok(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| Ok(c.to_vec())).collect(),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for ChunkSynthesizer {
        async fn synthesize(&self, text: &str) -> anyhow::Result<AudioChunkStream> {
            self.requests.lock().unwrap().push(text.to_string());
            let chunks: Vec<anyhow::Result<Vec<u8>>> = self
                .chunks
                .iter()
                .map(|c| match c {
                    Ok(bytes) => Ok(bytes.clone()),
                    Err(e) => Err(anyhow!(e.to_string())),
                })
                .collect();
            Ok(futures_util::stream::iter(chunks).boxed())
        }
    }

    struct RefusingSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for RefusingSynthesizer {
        async fn synthesize(&self, _text: &str) -> anyhow::Result<AudioChunkStream> {
            Err(anyhow!("quota exhausted"))
        }
    }

    #[derive(Default)]
    struct SinkLog {
        writes: Vec<Vec<u8>>,
        finished: bool,
        released: bool,
    }

    struct RecordingOutput {
        log: Arc<Mutex<SinkLog>>,
        specs: Arc<Mutex<Vec<SinkSpec>>>,
        fail_writes: bool,
    }

    impl RecordingOutput {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(SinkLog::default())),
                specs: Arc::new(Mutex::new(Vec::new())),
                fail_writes: false,
            }
        }
    }

    impl AudioOutput for RecordingOutput {
        fn open(&self, spec: &SinkSpec) -> anyhow::Result<Box<dyn AudioSink>> {
            self.specs.lock().unwrap().push(*spec);
            Ok(Box::new(RecordingSink {
                log: self.log.clone(),
                fail_writes: self.fail_writes,
            }))
        }
    }

    struct RecordingSink {
        log: Arc<Mutex<SinkLog>>,
        fail_writes: bool,
    }

    impl AudioSink for RecordingSink {
        fn write(&mut self, chunk: &[u8]) -> anyhow::Result<()> {
            if self.fail_writes {
                return Err(anyhow!("device gone"));
            }
            self.log.lock().unwrap().writes.push(chunk.to_vec());
            Ok(())
        }

        fn finish(self: Box<Self>) -> anyhow::Result<()> {
            self.log.lock().unwrap().finished = true;
            Ok(())
        }
    }

    impl Drop for RecordingSink {
        fn drop(&mut self) {
            self.log.lock().unwrap().released = true;
        }
    }

    fn pipeline_with(
        generator: Arc<dyn MessageGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: RecordingOutput,
    ) -> (NotificationPipeline, Arc<Mutex<SinkLog>>, Arc<Mutex<Vec<SinkSpec>>>) {
        let log = output.log.clone();
        let specs = output.specs.clone();
        let pipeline = NotificationPipeline::new(generator, synthesizer, Box::new(output), 20000);
        (pipeline, log, specs)
    }

    #[tokio::test]
    async fn writes_chunks_in_order_then_closes() {
        let synthesizer = ChunkSynthesizer::ok(&[b"b1", b"b2", b"b3"]);
        let (pipeline, log, specs) = pipeline_with(
            Arc::new(FixedGenerator("Move out, soldier!")),
            Arc::new(synthesizer),
            RecordingOutput::new(),
        );

        let outcome = pipeline.notify("Terminal", &["Terminal".to_string()]).await;

        assert_eq!(outcome.stage, PipelineStage::Done);
        assert_eq!(outcome.source, MessageSource::Model);
        assert_eq!(outcome.text, "Move out, soldier!");
        assert!(outcome.error.is_none());

        let log = log.lock().unwrap();
        assert_eq!(log.writes, vec![b"b1".to_vec(), b"b2".to_vec(), b"b3".to_vec()]);
        assert!(log.finished);
        assert!(log.released);

        let specs = specs.lock().unwrap();
        assert_eq!(specs.as_slice(), &[SinkSpec { channels: 1, sample_rate: 20000 }]);
    }

    #[tokio::test]
    async fn pads_text_before_synthesis() {
        let synthesizer = ChunkSynthesizer::ok(&[b"pcm"]);
        let requests = synthesizer.requests.clone();
        let (pipeline, _, _) = pipeline_with(
            Arc::new(FixedGenerator("Eyes on the prize!")),
            Arc::new(synthesizer),
            RecordingOutput::new(),
        );

        pipeline.notify("Terminal", &[]).await;

        let requests = requests.lock().unwrap();
        assert_eq!(requests.as_slice(), &["   Eyes on the prize!".to_string()]);
    }

    #[tokio::test]
    async fn generation_failure_speaks_fallback() {
        let synthesizer = ChunkSynthesizer::ok(&[b"pcm"]);
        let requests = synthesizer.requests.clone();
        let (pipeline, log, _) = pipeline_with(
            Arc::new(FailingGenerator),
            Arc::new(synthesizer),
            RecordingOutput::new(),
        );

        let outcome = pipeline.notify("YouTube", &[]).await;

        assert_eq!(outcome.source, MessageSource::Fallback);
        assert_eq!(outcome.text, FALLBACK_MESSAGE);
        assert_eq!(outcome.stage, PipelineStage::Done);

        // The fallback still goes through synthesis and playback.
        let requests = requests.lock().unwrap();
        assert_eq!(requests.as_slice(), &[format!("   {FALLBACK_MESSAGE}")]);
        assert!(log.lock().unwrap().finished);
    }

    #[tokio::test]
    async fn synthesis_refusal_skips_playback() {
        let (pipeline, log, specs) = pipeline_with(
            Arc::new(FixedGenerator("Push on!")),
            Arc::new(RefusingSynthesizer),
            RecordingOutput::new(),
        );

        let outcome = pipeline.notify("Terminal", &[]).await;

        assert_eq!(outcome.stage, PipelineStage::SynthesisFailed);
        assert_eq!(outcome.source, MessageSource::Model);
        assert!(outcome.error.as_deref().unwrap().contains("quota exhausted"));
        assert!(specs.lock().unwrap().is_empty());
        assert!(!log.lock().unwrap().released);
    }

    #[tokio::test]
    async fn stream_break_releases_sink_without_finish() {
        let synthesizer = ChunkSynthesizer {
            chunks: vec![Ok(b"b1".to_vec()), Err(anyhow!("connection reset"))],
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let (pipeline, log, _) = pipeline_with(
            Arc::new(FixedGenerator("Hold the line!")),
            Arc::new(synthesizer),
            RecordingOutput::new(),
        );

        let outcome = pipeline.notify("Terminal", &[]).await;

        assert_eq!(outcome.stage, PipelineStage::SynthesisFailed);
        let log = log.lock().unwrap();
        assert_eq!(log.writes, vec![b"b1".to_vec()]);
        assert!(!log.finished);
        assert!(log.released);
    }

    #[tokio::test]
    async fn write_failure_releases_sink() {
        let synthesizer = ChunkSynthesizer::ok(&[b"b1", b"b2"]);
        let mut output = RecordingOutput::new();
        output.fail_writes = true;
        let (pipeline, log, _) = pipeline_with(
            Arc::new(FixedGenerator("Keep moving!")),
            Arc::new(synthesizer),
            output,
        );

        let outcome = pipeline.notify("Terminal", &[]).await;

        assert_eq!(outcome.stage, PipelineStage::PlaybackFailed);
        let log = log.lock().unwrap();
        assert!(log.writes.is_empty());
        assert!(!log.finished);
        assert!(log.released);
    }
}
