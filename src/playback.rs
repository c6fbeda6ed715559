//! Audio output through rodio.
//!
//! Synthesis delivers raw 16-bit mono PCM; each chunk is decoded to f32
//! samples and queued on a sink, so playback follows arrival order.

use anyhow::Context;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::debug;

/// Stream configuration for one notification's audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSpec {
    pub channels: u16,
    pub sample_rate: u32,
}

/// Opens one sink per spoken notification.
pub trait AudioOutput {
    fn open(&self, spec: &SinkSpec) -> anyhow::Result<Box<dyn AudioSink>>;
}

/// Accepts sequential PCM chunk writes for a single utterance.
///
/// Dropping a sink stops its playback immediately; `finish` blocks until
/// everything queued has been heard.
pub trait AudioSink: Send {
    fn write(&mut self, chunk: &[u8]) -> anyhow::Result<()>;
    fn finish(self: Box<Self>) -> anyhow::Result<()>;
}

/// Audio device handle, opened once and kept for the process lifetime.
// In rodio 0.21, OutputStream is the handle — no separate OutputStreamHandle
pub struct RodioOutput {
    output_stream: OutputStream,
}

impl RodioOutput {
    pub fn new() -> anyhow::Result<Self> {
        let output_stream =
            OutputStreamBuilder::open_default_stream().context("Failed to open audio output")?;
        Ok(Self { output_stream })
    }
}

impl AudioOutput for RodioOutput {
    fn open(&self, spec: &SinkSpec) -> anyhow::Result<Box<dyn AudioSink>> {
        // rodio 0.21: Sink::connect_new takes &Mixer
        let sink = Sink::connect_new(self.output_stream.mixer());
        Ok(Box::new(RodioSink {
            sink,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            pending: Vec::new(),
        }))
    }
}

struct RodioSink {
    sink: Sink,
    channels: u16,
    sample_rate: u32,
    // Chunk boundaries are arbitrary; a sample can be split across two writes.
    pending: Vec<u8>,
}

impl AudioSink for RodioSink {
    fn write(&mut self, chunk: &[u8]) -> anyhow::Result<()> {
        self.pending.extend_from_slice(chunk);
        let samples = take_whole_samples(&mut self.pending);
        if samples.is_empty() {
            return Ok(());
        }

        self.sink
            .append(SamplesBuffer::new(self.channels, self.sample_rate, samples));
        Ok(())
    }

    fn finish(self: Box<Self>) -> anyhow::Result<()> {
        if !self.pending.is_empty() {
            debug!("Discarding {} trailing bytes of partial sample", self.pending.len());
        }
        self.sink.sleep_until_end();
        Ok(())
    }
}

/// Drain as many complete samples as the buffer holds, keeping a trailing
/// odd byte for the next write.
fn take_whole_samples(pending: &mut Vec<u8>) -> Vec<f32> {
    let usable = pending.len() - pending.len() % 2;
    if usable == 0 {
        return Vec::new();
    }

    // i16 LE → f32 [-1, 1]
    let samples = pending[..usable]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    pending.drain(..usable);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_samples() {
        let mut pending = vec![0x00, 0x40, 0x00, 0x80];
        let samples = take_whole_samples(&mut pending);
        assert_eq!(samples, vec![0.5, -1.0]);
        assert!(pending.is_empty());
    }

    #[test]
    fn holds_odd_trailing_byte_for_next_write() {
        let mut pending = vec![0x00, 0x40, 0x12];
        let samples = take_whole_samples(&mut pending);
        assert_eq!(samples, vec![0.5]);
        assert_eq!(pending, vec![0x12]);

        pending.push(0x00);
        let samples = take_whole_samples(&mut pending);
        assert_eq!(samples, vec![0x12 as f32 / 32768.0]);
        assert!(pending.is_empty());
    }

    #[test]
    fn single_byte_yields_nothing() {
        let mut pending = vec![0x7f];
        assert!(take_whole_samples(&mut pending).is_empty());
        assert_eq!(pending, vec![0x7f]);
    }
}
