//! Fakes for the gateway, speech and audio capabilities, plus small polling
//! helpers shared by the integration tests.

use async_trait::async_trait;
use durgas::config::DesktopConfig;
use durgas::gateway::{
    AiGateway, AudioFrame, ModelTier, RealtimeChannel, RealtimeConnection, RealtimeEvent,
    RealtimeSessionConfig, ToolDefinition, ToolResponse, Turn,
};
use durgas::platform::{
    AudioOutput, Microphone, MicrophoneStream, RecognitionEvent, RecognitionMode,
    SpeechRecognizer, pcm16_duration,
};
use durgas::{Desktop, DesktopError, DesktopEvent, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Desktop with fast timers and wake listening switched off.
pub(crate) fn quiet_config() -> DesktopConfig {
    let mut config = DesktopConfig::default();
    config.assistant.wake_word_enabled = false;
    config.assistant.error_recovery_ms = 20;
    config.assistant.wake_restart_delay_ms = 10;
    config.assistant.wake_cooldown_ms = 0;
    config
}

pub(crate) fn desktop(config: DesktopConfig) -> Arc<Desktop> {
    Arc::new(Desktop::new(config).expect("boot desktop"))
}

/// Poll `check` every few milliseconds until it holds or two seconds pass.
pub(crate) async fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Everything published so far, without waiting.
pub(crate) fn drain(rx: &mut broadcast::Receiver<DesktopEvent>) -> Vec<DesktopEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ── Gateway ─────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeConnection {
    pub frames: Mutex<Vec<AudioFrame>>,
    pub closed: AtomicBool,
}

impl FakeConnection {
    pub(crate) fn frames(&self) -> Vec<AudioFrame> {
        self.frames.lock().expect("frames").clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct SharedConnection(Arc<FakeConnection>);

#[async_trait]
impl RealtimeConnection for SharedConnection {
    async fn send_audio(&self, frame: AudioFrame) -> Result<()> {
        self.0.frames.lock().expect("frames").push(frame);
        Ok(())
    }

    async fn close(&self) {
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

/// Gateway that replays queued tool responses and records what it was sent.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<ToolResponse>>>,
    pub requests: Mutex<Vec<Vec<Turn>>>,
    pub spoken: Mutex<Vec<String>>,
    pub connection: Arc<FakeConnection>,
    realtime_tx: Mutex<Option<mpsc::Sender<RealtimeEvent>>>,
    realtime_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub realtime_opens: AtomicUsize,
    pub refuse_realtime: AtomicBool,
    pub fail_tts: AtomicBool,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_reply(&self, reply: Result<ToolResponse>) {
        self.replies.lock().expect("replies").push_back(reply);
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().expect("requests").len()
    }

    pub(crate) fn spoke(&self, text: &str) -> bool {
        self.spoken.lock().expect("spoken").iter().any(|s| s == text)
    }

    /// Make the next `open_realtime` wait until the returned sender fires.
    pub(crate) fn hold_realtime(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.realtime_gate.lock().expect("realtime gate") = Some(rx);
        tx
    }

    /// Sender for server events of the open realtime session.
    pub(crate) fn realtime_events(&self) -> mpsc::Sender<RealtimeEvent> {
        self.realtime_tx
            .lock()
            .expect("realtime tx")
            .clone()
            .expect("realtime session opened")
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    async fn chat(&self, prompt: &str, _tier: ModelTier) -> Result<String> {
        Ok(format!("answer to {prompt}"))
    }

    async fn respond_with_tools(
        &self,
        history: &[Turn],
        _tools: &[ToolDefinition],
    ) -> Result<ToolResponse> {
        self.requests
            .lock()
            .expect("requests")
            .push(history.to_vec());
        self.replies
            .lock()
            .expect("replies")
            .pop_front()
            .unwrap_or_else(|| Ok(ToolResponse::default()))
    }

    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>> {
        self.spoken.lock().expect("spoken").push(text.to_owned());
        if self.fail_tts.load(Ordering::SeqCst) {
            return Err(DesktopError::Gateway("speech synthesis unavailable".into()));
        }
        Ok(vec![0; 480])
    }

    async fn open_realtime(&self, _config: RealtimeSessionConfig) -> Result<RealtimeChannel> {
        self.realtime_opens.fetch_add(1, Ordering::SeqCst);
        let gate = self.realtime_gate.lock().expect("realtime gate").take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.refuse_realtime.load(Ordering::SeqCst) {
            return Err(DesktopError::Gateway("realtime endpoint unavailable".into()));
        }
        let (tx, rx) = mpsc::channel(32);
        *self.realtime_tx.lock().expect("realtime tx") = Some(tx);
        Ok(RealtimeChannel {
            connection: Box::new(SharedConnection(Arc::clone(&self.connection))),
            events: rx,
        })
    }
}

// ── Speech recognition ──────────────────────────────────────────────

/// What one `listen` call produces.
pub(crate) enum Script {
    /// Emit these events, then end the session.
    Events(Vec<RecognitionEvent>),
    /// Stay open and silent until cancelled.
    Hold,
    /// Fail to start with a permission error.
    Deny,
}

#[derive(Default)]
pub(crate) struct ScriptedRecognizer {
    continuous: Mutex<VecDeque<Script>>,
    one_shot: Mutex<VecDeque<Script>>,
    pub continuous_calls: AtomicUsize,
    pub one_shot_calls: AtomicUsize,
    pub tokens: Mutex<Vec<CancellationToken>>,
}

impl ScriptedRecognizer {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn script(&self, mode: RecognitionMode, script: Script) {
        let queue = match mode {
            RecognitionMode::Continuous => &self.continuous,
            RecognitionMode::OneShot => &self.one_shot,
        };
        queue.lock().expect("script").push_back(script);
    }

    pub(crate) fn continuous_calls(&self) -> usize {
        self.continuous_calls.load(Ordering::SeqCst)
    }

    /// True once every session handed out so far has been cancelled or ended.
    pub(crate) fn all_cancelled(&self) -> bool {
        self.tokens
            .lock()
            .expect("tokens")
            .iter()
            .all(CancellationToken::is_cancelled)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn listen(
        &self,
        mode: RecognitionMode,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let script = match mode {
            RecognitionMode::Continuous => {
                self.continuous_calls.fetch_add(1, Ordering::SeqCst);
                self.continuous.lock().expect("script").pop_front()
            }
            RecognitionMode::OneShot => {
                self.one_shot_calls.fetch_add(1, Ordering::SeqCst);
                self.one_shot.lock().expect("script").pop_front()
            }
        };
        let (tx, rx) = mpsc::channel(16);
        match script.unwrap_or(Script::Hold) {
            Script::Deny => {
                return Err(DesktopError::PermissionDenied("microphone".into()));
            }
            Script::Events(events) => {
                // Dropping the sender afterwards ends the session.
                for event in events {
                    tx.send(event).await.expect("scripted event");
                }
            }
            Script::Hold => {
                self.tokens.lock().expect("tokens").push(cancel.clone());
                tokio::spawn(async move {
                    cancel.cancelled().await;
                    drop(tx);
                });
            }
        }
        Ok(rx)
    }
}

// ── Microphone and speaker ──────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeMicrophone {
    pub deny: AtomicBool,
    feed: Mutex<Option<mpsc::Sender<Vec<f32>>>>,
    pub released: Mutex<Option<CancellationToken>>,
}

impl FakeMicrophone {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn feed(&self) -> mpsc::Sender<Vec<f32>> {
        self.feed
            .lock()
            .expect("feed")
            .clone()
            .expect("microphone opened")
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released
            .lock()
            .expect("released")
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

#[async_trait]
impl Microphone for FakeMicrophone {
    async fn open(&self, _sample_rate: u32) -> Result<MicrophoneStream> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(DesktopError::PermissionDenied("microphone".into()));
        }
        let (tx, rx) = mpsc::channel(16);
        let release = CancellationToken::new();
        *self.feed.lock().expect("feed") = Some(tx);
        *self.released.lock().expect("released") = Some(release.clone());
        Ok(MicrophoneStream::new(rx, release))
    }
}

/// Speaker with a settable clock that records every clip.
#[derive(Default)]
pub(crate) struct FakeAudio {
    pub clock: Mutex<f64>,
    pub played: Mutex<Vec<usize>>,
    pub scheduled: Mutex<Vec<(f64, f64)>>,
    pub stops: AtomicUsize,
}

impl FakeAudio {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_clock(&self, now: f64) {
        *self.clock.lock().expect("clock") = now;
    }

    pub(crate) fn scheduled(&self) -> Vec<(f64, f64)> {
        self.scheduled.lock().expect("scheduled").clone()
    }
}

#[async_trait]
impl AudioOutput for FakeAudio {
    fn now(&self) -> f64 {
        *self.clock.lock().expect("clock")
    }

    async fn play(&self, pcm16: &[u8], _sample_rate: u32) -> Result<()> {
        self.played.lock().expect("played").push(pcm16.len());
        Ok(())
    }

    fn schedule(&self, pcm16: &[u8], sample_rate: u32, start_at: f64) -> Result<f64> {
        let duration = pcm16_duration(pcm16.len(), sample_rate);
        self.scheduled
            .lock()
            .expect("scheduled")
            .push((start_at, duration));
        Ok(duration)
    }

    fn stop_all(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
