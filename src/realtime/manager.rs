//! Realtime duplex voice session lifecycle.

use super::chunker::FrameChunker;
use super::codec::{decode_audio, encode_frame};
use super::playback::PlaybackScheduler;
use super::transcript::{TranscriptTurn, TurnAccumulator};
use crate::config::RealtimeConfig;
use crate::desktop::Desktop;
use crate::error::{DesktopError, Result, error_codes};
use crate::gateway::{
    AiGateway, RealtimeConnection, RealtimeEvent, RealtimeSessionConfig, ServerMessage,
};
use crate::platform::{AudioOutput, Microphone, MicrophoneStream};
use crate::runtime::DesktopEvent;
use crate::voice::{VoiceLease, VoiceModality};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shown when the microphone cannot be opened.
const MIC_DENIED_MESSAGE: &str =
    "Microphone access is required for the live assistant. Please allow it and try again.";

/// Snapshot of the session for the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeStatus {
    /// The server accepted the session and audio is flowing.
    pub active: bool,
    /// `start` is waiting on the microphone or the gateway.
    pub starting: bool,
    /// Partial user speech of the turn in progress.
    pub current_input: String,
    /// Partial model speech of the turn in progress.
    pub current_output: String,
    pub turns: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Starting,
    Active,
}

struct Shared {
    generation: u64,
    phase: Phase,
    lease: Option<VoiceLease>,
    connection: Option<Arc<dyn RealtimeConnection>>,
    cancel: Option<CancellationToken>,
    /// Task owning the microphone stream and the inbound event loop.
    task: Option<JoinHandle<()>>,
    transcripts: Arc<Vec<TranscriptTurn>>,
    current_input: String,
    current_output: String,
}

struct Inner {
    desktop: Arc<Desktop>,
    gateway: Arc<dyn AiGateway>,
    microphone: Arc<dyn Microphone>,
    audio: Arc<dyn AudioOutput>,
    config: RealtimeConfig,
    shared: Mutex<Shared>,
}

/// Owns at most one realtime session at a time. Clones share the session.
#[derive(Clone)]
pub struct RealtimeSessionManager {
    inner: Arc<Inner>,
}

impl RealtimeSessionManager {
    pub fn new(
        desktop: Arc<Desktop>,
        gateway: Arc<dyn AiGateway>,
        microphone: Arc<dyn Microphone>,
        audio: Arc<dyn AudioOutput>,
    ) -> Self {
        let config = desktop.config().realtime.clone();
        Self {
            inner: Arc::new(Inner {
                desktop,
                gateway,
                microphone,
                audio,
                config,
                shared: Mutex::new(Shared {
                    generation: 0,
                    phase: Phase::Idle,
                    lease: None,
                    connection: None,
                    cancel: None,
                    task: None,
                    transcripts: Arc::new(Vec::new()),
                    current_input: String::new(),
                    current_output: String::new(),
                }),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().phase == Phase::Active
    }

    pub fn status(&self) -> RealtimeStatus {
        let shared = self.inner.lock();
        RealtimeStatus {
            active: shared.phase == Phase::Active,
            starting: shared.phase == Phase::Starting,
            current_input: shared.current_input.clone(),
            current_output: shared.current_output.clone(),
            turns: shared.transcripts.len(),
        }
    }

    /// Completed turns of the current (or last) session.
    pub fn transcripts(&self) -> Arc<Vec<TranscriptTurn>> {
        Arc::clone(&self.inner.lock().transcripts)
    }

    /// Open the microphone and a realtime connection.
    ///
    /// Returns once the connection is established; the session reports
    /// `active` when the server confirms it.
    ///
    /// # Errors
    ///
    /// - `VoiceBusy` when a session is already running or the assistant is
    ///   not idle.
    /// - `PermissionDenied` when the microphone is refused (an alert is
    ///   published too).
    /// - `Gateway` when the connection cannot be opened.
    /// - `SessionClosed` when [`stop`](Self::stop) ran while starting.
    pub async fn start(&self) -> Result<()> {
        let lease = self
            .inner
            .desktop
            .voice()
            .try_acquire(VoiceModality::Realtime)?;
        let generation = {
            let mut shared = self.inner.lock();
            shared.generation += 1;
            shared.phase = Phase::Starting;
            shared.lease = Some(lease);
            shared.generation
        };
        info!(generation, "realtime session starting");

        let mic = match self
            .inner
            .microphone
            .open(self.inner.config.input_sample_rate)
            .await
        {
            Ok(mic) => mic,
            Err(e) => {
                warn!(generation, error = %e, "microphone unavailable, aborting session");
                if matches!(e, DesktopError::PermissionDenied(_)) {
                    self.inner
                        .desktop
                        .alert(error_codes::PERMISSION_DENIED, MIC_DENIED_MESSAGE);
                }
                self.inner.teardown(generation, true).await;
                return Err(e);
            }
        };
        if !self.inner.is_current(generation) {
            debug!(generation, "session stopped while opening microphone");
            return Err(DesktopError::SessionClosed("realtime session stopped".into()));
        }

        let session_config = RealtimeSessionConfig {
            system_instruction: self.inner.config.system_instruction.clone(),
            input_transcription: true,
            output_transcription: true,
            output_sample_rate: self.inner.config.output_sample_rate,
        };
        let channel = match self.inner.gateway.open_realtime(session_config).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(generation, error = %e, "realtime connection failed");
                self.inner.teardown(generation, true).await;
                return Err(e);
            }
        };
        let connection: Arc<dyn RealtimeConnection> = Arc::from(channel.connection);

        let cancel = CancellationToken::new();
        let attached = {
            let mut shared = self.inner.lock();
            let live = shared.generation == generation && shared.phase != Phase::Idle;
            if live {
                shared.connection = Some(Arc::clone(&connection));
                shared.cancel = Some(cancel.clone());
                // Spawned under the lock so a concurrent stop always finds the
                // handle to join.
                let inner = Arc::clone(&self.inner);
                let session_connection = Arc::clone(&connection);
                shared.task = Some(tokio::spawn(async move {
                    inner
                        .run_session(generation, session_connection, channel.events, mic, cancel)
                        .await;
                    inner.teardown(generation, false).await;
                }));
            }
            live
        };
        if !attached {
            debug!(generation, "session stopped while connecting");
            connection.close().await;
            return Err(DesktopError::SessionClosed("realtime session stopped".into()));
        }
        Ok(())
    }

    /// End the session. Safe to call at any time, any number of times.
    pub async fn stop(&self) {
        let generation = self.inner.lock().generation;
        self.inner.teardown(generation, true).await;
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        let shared = self.lock();
        shared.generation == generation && shared.phase != Phase::Idle
    }

    /// Close the connection, stop playback, release the microphone and the
    /// voice lease and reset the turn state. No-op when `generation` is
    /// already torn down.
    ///
    /// With `join_session` the session task is awaited, so the microphone
    /// stream is dropped before this returns. The session task itself passes
    /// `false`.
    async fn teardown(&self, generation: u64, join_session: bool) {
        let (connection, cancel, task, lease, was_active) = {
            let mut shared = self.lock();
            if shared.generation != generation || shared.phase == Phase::Idle {
                return;
            }
            let was_active = shared.phase == Phase::Active;
            shared.phase = Phase::Idle;
            shared.current_input.clear();
            shared.current_output.clear();
            (
                shared.connection.take(),
                shared.cancel.take(),
                shared.task.take(),
                shared.lease.take(),
                was_active,
            )
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(connection) = connection {
            connection.close().await;
        }
        if let Some(task) = task.filter(|_| join_session)
            && let Err(e) = task.await
        {
            warn!(generation, error = %e, "realtime session task failed");
        }
        self.audio.stop_all();
        drop(lease);
        info!(generation, "realtime session stopped");
        if was_active {
            self.desktop
                .publish(DesktopEvent::RealtimeActive { active: false });
            self.desktop.publish(DesktopEvent::RealtimePartial {
                input: String::new(),
                output: String::new(),
            });
        }
    }

    async fn run_session(
        &self,
        generation: u64,
        connection: Arc<dyn RealtimeConnection>,
        mut events: mpsc::Receiver<RealtimeEvent>,
        mut mic: MicrophoneStream,
        cancel: CancellationToken,
    ) {
        let mut chunker = FrameChunker::new(self.config.frame_samples);
        let mut playback = PlaybackScheduler::new();
        let mut turn = TurnAccumulator::new();
        let mut opened = false;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(RealtimeEvent::Opened) => {
                        opened = self.on_opened(generation);
                        if !opened {
                            break;
                        }
                    }
                    Some(RealtimeEvent::Message(message)) => {
                        if !self.on_message(generation, &message, &mut turn, &mut playback) {
                            break;
                        }
                    }
                    Some(RealtimeEvent::Error(reason)) => {
                        warn!(generation, reason = %reason, "realtime session error");
                        break;
                    }
                    Some(RealtimeEvent::Closed) | None => {
                        info!(generation, "realtime connection closed");
                        break;
                    }
                },
                chunk = mic.chunks.recv(), if opened => match chunk {
                    Some(samples) => {
                        for frame in chunker.push(&samples) {
                            let frame = encode_frame(&frame, &self.config.input_mime_type);
                            if let Err(e) = connection.send_audio(frame).await {
                                debug!(generation, error = %e, "audio frame not sent");
                            }
                        }
                    }
                    None => {
                        warn!(generation, "microphone stream ended");
                        break;
                    }
                },
            }
        }
    }

    fn on_opened(&self, generation: u64) -> bool {
        {
            let mut shared = self.lock();
            if shared.generation != generation {
                return false;
            }
            match shared.phase {
                Phase::Idle => return false,
                Phase::Active => return true,
                Phase::Starting => {}
            }
            shared.phase = Phase::Active;
            shared.transcripts = Arc::new(Vec::new());
            shared.current_input.clear();
            shared.current_output.clear();
        }
        info!(generation, "realtime session active");
        self.desktop
            .publish(DesktopEvent::RealtimeActive { active: true });
        true
    }

    /// Apply one server message. Returns `false` when the session is stale.
    fn on_message(
        &self,
        generation: u64,
        message: &ServerMessage,
        turn: &mut TurnAccumulator,
        playback: &mut PlaybackScheduler,
    ) -> bool {
        if let Some(text) = &message.output_transcription {
            turn.push_output(text);
        }
        if let Some(text) = &message.input_transcription {
            turn.push_input(text);
        }
        let has_text = message.output_transcription.is_some() || message.input_transcription.is_some();
        let completed = message.turn_complete.then(|| turn.complete());

        {
            let mut shared = self.lock();
            if shared.generation != generation || shared.phase == Phase::Idle {
                return false;
            }
            shared.current_input = turn.input().to_owned();
            shared.current_output = turn.output().to_owned();
            if let Some(done) = &completed {
                Arc::make_mut(&mut shared.transcripts).push(done.clone());
            }
        }

        if has_text || completed.is_some() {
            self.desktop.publish(DesktopEvent::RealtimePartial {
                input: turn.input().to_owned(),
                output: turn.output().to_owned(),
            });
        }
        if let Some(done) = completed {
            debug!(generation, user = %done.user, model = %done.model, "realtime turn complete");
            self.desktop.publish(DesktopEvent::RealtimeTurn(done));
        }

        if let Some(data) = &message.audio {
            let played = decode_audio(data).and_then(|pcm| {
                playback.enqueue(self.audio.as_ref(), &pcm, self.config.output_sample_rate)
            });
            if let Err(e) = played {
                warn!(generation, error = %e, "realtime audio dropped");
            }
        }
        true
    }
}
