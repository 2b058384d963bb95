//! Host audio and speech capabilities.
//!
//! The desktop core never touches devices directly. The embedding host
//! supplies a [`Microphone`], a [`SpeechRecognizer`] and an [`AudioOutput`];
//! tests supply fakes.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Live microphone capture.
///
/// Samples arrive as mono `f32` chunks in `[-1.0, 1.0]` at the requested rate.
/// Dropping the stream releases the device.
pub struct MicrophoneStream {
    pub chunks: mpsc::Receiver<Vec<f32>>,
    release: CancellationToken,
}

impl MicrophoneStream {
    /// `release` is cancelled when the stream is dropped; the capture side
    /// should stop and free the device when it fires.
    pub fn new(chunks: mpsc::Receiver<Vec<f32>>, release: CancellationToken) -> Self {
        Self { chunks, release }
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        self.release.cancel();
    }
}

#[async_trait]
pub trait Microphone: Send + Sync {
    /// Ask for capture permission and start streaming.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the user refuses access, `Audio` when no
    /// device is usable.
    async fn open(&self, sample_rate: u32) -> Result<MicrophoneStream>;
}

/// How long a recognition session lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Keep listening and emit interim transcripts (wake-phrase spotting).
    Continuous,
    /// Stop after the first utterance (command capture).
    OneShot,
}

/// Why a recognition session failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Nothing was said before the recognizer timed out.
    NoSpeech,
    /// The session was aborted by a stop request.
    Aborted,
    PermissionDenied,
    Other(String),
}

impl RecognitionError {
    /// Errors after which listening can simply be restarted.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoSpeech | Self::Aborted)
    }
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSpeech => f.write_str("no speech detected"),
            Self::Aborted => f.write_str("recognition aborted"),
            Self::PermissionDenied => f.write_str("microphone permission denied"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

/// Events of one recognition session. `Ended` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Interim transcript of the utterance so far.
    Partial(String),
    /// Final transcript of one utterance.
    Final(String),
    Error(RecognitionError),
    Ended,
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Start a recognition session. Cancelling `cancel` stops it; the
    /// session then emits `Ended`.
    async fn listen(
        &self,
        mode: RecognitionMode,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<RecognitionEvent>>;
}

/// Speaker output with a monotonic playback clock (seconds).
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Current time on the playback clock.
    fn now(&self) -> f64;

    /// Play little-endian PCM16 mono to completion.
    async fn play(&self, pcm16: &[u8], sample_rate: u32) -> Result<()>;

    /// Queue PCM16 audio to start at `start_at` on the playback clock.
    /// Returns the clip duration in seconds.
    fn schedule(&self, pcm16: &[u8], sample_rate: u32, start_at: f64) -> Result<f64>;

    /// Drop everything queued by [`schedule`](Self::schedule).
    fn stop_all(&self);
}

/// Duration of a PCM16 mono buffer in seconds.
pub fn pcm16_duration(byte_len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (byte_len / 2) as f64 / f64::from(sample_rate)
}
