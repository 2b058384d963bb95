//! The assistant actor.
//!
//! A single task owns the state machine and consumes [`Event`]s from one
//! queue. Recognition, gateway calls and playback run in helper tasks that
//! report back through the same queue, tagged with the cycle (or wake
//! listener generation) that started them. Results for a cycle that is no
//! longer current are dropped.

use super::history::ConversationHistory;
use super::state::AssistantState;
use super::tools::{ToolContext, ToolRegistry};
use super::wake::find_wake_phrase;
use crate::config::AssistantConfig;
use crate::desktop::Desktop;
use crate::error::{DesktopError, Result, error_codes};
use crate::gateway::{AiGateway, ToolDefinition};
use crate::platform::{
    AudioOutput, RecognitionError, RecognitionEvent, RecognitionMode, SpeechRecognizer,
};
use crate::runtime::DesktopEvent;
use crate::voice::{VoiceLease, VoiceModality};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of a manual activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Command capture started.
    Started,
    /// A cycle is already running; nothing changed.
    AlreadyActive(AssistantState),
    /// A realtime session owns the microphone; the refusal was spoken.
    Refused,
}

enum Event {
    Activate(oneshot::Sender<Activation>),
    WakeDetected { generation: u64 },
    WakeEnded {
        generation: u64,
        error: Option<RecognitionError>,
    },
    RestartWake { generation: u64 },
    CapturePartial { cycle: u64, text: String },
    CaptureFinished {
        cycle: u64,
        transcript: String,
        error: Option<RecognitionError>,
    },
    Replied {
        cycle: u64,
        outcome: Result<(String, ConversationHistory)>,
    },
    SpeechDone { cycle: u64 },
    Recover { cycle: u64 },
}

/// Cheap clonable handle to a running assistant.
#[derive(Clone)]
pub struct AssistantHandle {
    tx: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<AssistantState>,
    transcript: watch::Receiver<String>,
    shutdown: CancellationToken,
}

impl AssistantHandle {
    pub fn state(&self) -> AssistantState {
        *self.state.borrow()
    }

    /// Partial transcript of the current (or last) command.
    pub fn transcript(&self) -> String {
        self.transcript.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AssistantState> {
        self.state.clone()
    }

    /// Manual activation, equivalent to hearing the wake phrase.
    ///
    /// # Errors
    ///
    /// `SessionClosed` when the assistant has shut down.
    pub async fn activate(&self) -> Result<Activation> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Event::Activate(reply_tx))
            .map_err(|_| DesktopError::SessionClosed("assistant stopped".into()))?;
        reply_rx
            .await
            .map_err(|_| DesktopError::SessionClosed("assistant stopped".into()))
    }

    /// Stop the actor and every helper task it owns.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.tx.is_closed()
    }
}

/// Builder for the assistant actor. Call [`spawn`](Self::spawn) to run it.
pub struct AssistantCoordinator {
    desktop: Arc<Desktop>,
    gateway: Arc<dyn AiGateway>,
    recognizer: Arc<dyn SpeechRecognizer>,
    audio: Arc<dyn AudioOutput>,
    tools: ToolRegistry,
}

impl AssistantCoordinator {
    pub fn new(
        desktop: Arc<Desktop>,
        gateway: Arc<dyn AiGateway>,
        recognizer: Arc<dyn SpeechRecognizer>,
        audio: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            desktop,
            gateway,
            recognizer,
            audio,
            tools: ToolRegistry::with_desktop_tools(),
        }
    }

    /// Replace the built-in tool set.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Start the actor on the current runtime.
    pub fn spawn(self) -> AssistantHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AssistantState::Idle);
        let (transcript_tx, transcript_rx) = watch::channel(String::new());
        let shutdown = CancellationToken::new();
        let config = self.desktop.config().assistant.clone();
        let tts_sample_rate = self.desktop.config().realtime.output_sample_rate;

        let actor = Actor {
            ctx: ToolContext {
                desktop: self.desktop,
                gateway: self.gateway,
            },
            recognizer: self.recognizer,
            audio: self.audio,
            tools: Arc::new(self.tools),
            config,
            tts_sample_rate,
            tx: tx.clone(),
            state_tx,
            transcript_tx,
            shutdown: shutdown.clone(),
            history: Some(ConversationHistory::new()),
            cycle: 0,
            cycle_cancel: None,
            lease: None,
            wake_generation: 0,
            wake_cancel: None,
            wake_disabled: false,
            last_wake: None,
        };
        tokio::spawn(actor.run(rx));

        AssistantHandle {
            tx,
            state: state_rx,
            transcript: transcript_rx,
            shutdown,
        }
    }
}

struct Actor {
    ctx: ToolContext,
    recognizer: Arc<dyn SpeechRecognizer>,
    audio: Arc<dyn AudioOutput>,
    tools: Arc<ToolRegistry>,
    config: AssistantConfig,
    tts_sample_rate: u32,
    tx: mpsc::UnboundedSender<Event>,
    state_tx: watch::Sender<AssistantState>,
    transcript_tx: watch::Sender<String>,
    shutdown: CancellationToken,
    /// `None` while a reply is being produced; the task owns it then.
    history: Option<ConversationHistory>,
    cycle: u64,
    cycle_cancel: Option<CancellationToken>,
    lease: Option<VoiceLease>,
    wake_generation: u64,
    wake_cancel: Option<CancellationToken>,
    /// Set after a permission failure; cleared by the next manual activation.
    wake_disabled: bool,
    last_wake: Option<Instant>,
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Event>) {
        let mut voice = self.ctx.desktop.voice().subscribe();
        info!(wake_phrase = %self.config.wake_phrase, "assistant started");
        self.start_wake_listener();

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                changed = voice.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let modality = *voice.borrow_and_update();
                    self.on_voice_changed(modality);
                }
                event = rx.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        self.stop_wake_listener();
        if let Some(cancel) = self.cycle_cancel.take() {
            cancel.cancel();
        }
        self.lease = None;
        info!("assistant stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Activate(reply) => {
                let outcome = self.on_manual_activation();
                let _ = reply.send(outcome);
            }
            Event::WakeDetected { generation } => self.on_wake_detected(generation),
            Event::WakeEnded { generation, error } => self.on_wake_ended(generation, error),
            Event::RestartWake { generation } => {
                if generation == self.wake_generation {
                    self.start_wake_listener();
                }
            }
            Event::CapturePartial { cycle, text } => {
                if cycle == self.cycle && self.state() == AssistantState::Listening {
                    self.publish_transcript(text);
                }
            }
            Event::CaptureFinished {
                cycle,
                transcript,
                error,
            } => self.on_capture_finished(cycle, transcript, error),
            Event::Replied { cycle, outcome } => self.on_replied(cycle, outcome),
            Event::SpeechDone { cycle } => {
                if cycle == self.cycle && self.state() == AssistantState::Speaking {
                    self.finish_cycle(AssistantState::Idle);
                }
            }
            Event::Recover { cycle } => {
                if cycle == self.cycle && self.state() == AssistantState::Error {
                    self.finish_cycle(AssistantState::Idle);
                }
            }
        }
    }

    fn state(&self) -> AssistantState {
        *self.state_tx.borrow()
    }

    fn transition(&mut self, next: AssistantState) -> bool {
        let current = self.state();
        if current == next {
            return true;
        }
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, cycle = self.cycle, "illegal assistant transition ignored");
            return false;
        }
        self.state_tx.send_replace(next);
        info!(from = %current, to = %next, cycle = self.cycle, "assistant state");
        self.ctx
            .desktop
            .publish(DesktopEvent::AssistantState { state: next });
        true
    }

    fn publish_transcript(&self, text: String) {
        self.transcript_tx.send_replace(text.clone());
        self.ctx
            .desktop
            .publish(DesktopEvent::AssistantTranscript { text });
    }

    // ── Activation ──────────────────────────────────────────────────

    fn on_manual_activation(&mut self) -> Activation {
        let state = self.state();
        if !state.is_idle() {
            debug!(state = %state, "activation ignored, cycle already running");
            return Activation::AlreadyActive(state);
        }
        self.wake_disabled = false;
        match self.begin_cycle() {
            Ok(()) => Activation::Started,
            Err(e) => {
                info!(error = %e, "activation refused, realtime session active");
                self.speak_detached(self.config.busy_message.clone());
                Activation::Refused
            }
        }
    }

    fn on_wake_detected(&mut self, generation: u64) {
        if generation != self.wake_generation {
            return;
        }
        // The listener stops itself after a detection.
        self.wake_cancel = None;
        let now = Instant::now();
        let cooldown = Duration::from_millis(self.config.wake_cooldown_ms);
        if let Some(last) = self.last_wake
            && now.duration_since(last) < cooldown
        {
            debug!("wake phrase inside cooldown, ignored");
            self.schedule_wake_restart(generation);
            return;
        }
        self.last_wake = Some(now);
        info!("wake phrase detected");
        if let Err(e) = self.begin_cycle() {
            debug!(error = %e, "wake ignored");
            self.schedule_wake_restart(generation);
        }
    }

    /// Idle -> Listening: take the voice lease, reset history and start the
    /// one-shot capture.
    fn begin_cycle(&mut self) -> Result<()> {
        let lease = self
            .ctx
            .desktop
            .voice()
            .try_acquire(VoiceModality::Assistant)?;
        self.stop_wake_listener();
        self.lease = Some(lease);
        self.cycle += 1;
        let cancel = self.shutdown.child_token();
        self.cycle_cancel = Some(cancel.clone());
        self.history.get_or_insert_default().reset();
        self.publish_transcript(String::new());
        self.transition(AssistantState::Listening);

        let cycle = self.cycle;
        let recognizer = Arc::clone(&self.recognizer);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let (transcript, error) = capture_command(recognizer, cycle, cancel, &tx).await;
            let _ = tx.send(Event::CaptureFinished {
                cycle,
                transcript,
                error,
            });
        });
        Ok(())
    }

    fn on_capture_finished(
        &mut self,
        cycle: u64,
        transcript: String,
        error: Option<RecognitionError>,
    ) {
        if cycle != self.cycle || self.state() != AssistantState::Listening {
            debug!(cycle, "stale capture result dropped");
            return;
        }
        if let Some(error) = error {
            warn!(cycle, error = %error, "command capture failed");
            self.enter_error();
            return;
        }
        let text = transcript.trim().to_owned();
        if text.is_empty() {
            debug!(cycle, "nothing captured, back to idle");
            self.finish_cycle(AssistantState::Idle);
            return;
        }
        self.publish_transcript(text.clone());
        self.transition(AssistantState::Thinking);

        let history = self.history.take().unwrap_or_default();
        let ctx = self.ctx.clone();
        let tools = Arc::clone(&self.tools);
        let fallback = self.config.fallback_reply.clone();
        let cancel = self.cycle_token();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = cancel.cancelled() => Err(DesktopError::SessionClosed("cycle cancelled".into())),
                outcome = respond(&ctx, &tools, history, text, fallback) => outcome,
            };
            let _ = tx.send(Event::Replied { cycle, outcome });
        });
    }

    fn on_replied(&mut self, cycle: u64, outcome: Result<(String, ConversationHistory)>) {
        if cycle != self.cycle || self.state() != AssistantState::Thinking {
            debug!(cycle, "stale reply dropped");
            return;
        }
        match outcome {
            Ok((reply, history)) => {
                self.history = Some(history);
                self.transition(AssistantState::Speaking);
                let speak = self.speak(reply);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    speak.await;
                    let _ = tx.send(Event::SpeechDone { cycle });
                });
            }
            Err(e) => {
                error!(cycle, error = %e, "assistant pipeline failed");
                self.enter_error();
            }
        }
    }

    /// Enter `error`, speak the error message and schedule recovery.
    fn enter_error(&mut self) {
        if !self.transition(AssistantState::Error) {
            return;
        }
        let cycle = self.cycle;
        let speak = self.speak(self.config.error_message.clone());
        let delay = Duration::from_millis(self.config.error_recovery_ms);
        let cancel = self.cycle_token();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = async {
                    speak.await;
                    tokio::time::sleep(delay).await;
                } => {
                    let _ = tx.send(Event::Recover { cycle });
                }
            }
        });
    }

    /// Return to idle, hand the microphone back and resume wake listening.
    fn finish_cycle(&mut self, next: AssistantState) {
        if !self.transition(next) {
            return;
        }
        if let Some(cancel) = self.cycle_cancel.take() {
            cancel.cancel();
        }
        self.lease = None;
        self.start_wake_listener();
    }

    fn cycle_token(&self) -> CancellationToken {
        self.cycle_cancel
            .clone()
            .unwrap_or_else(|| self.shutdown.child_token())
    }

    // ── Speech output ───────────────────────────────────────────────

    /// Future that synthesizes and plays `text`. Failures are logged only.
    fn speak(&self, text: String) -> impl Future<Output = ()> + Send + 'static {
        let gateway = Arc::clone(&self.ctx.gateway);
        let audio = Arc::clone(&self.audio);
        let sample_rate = self.tts_sample_rate;
        async move {
            let played = async {
                let pcm = gateway.text_to_speech(&text).await?;
                audio.play(&pcm, sample_rate).await
            }
            .await;
            if let Err(e) = played {
                warn!(error = %e, "speech output failed, continuing silently");
            }
        }
    }

    fn speak_detached(&self, text: String) {
        tokio::spawn(self.speak(text));
    }

    // ── Wake listener ───────────────────────────────────────────────

    fn wake_allowed(&self) -> bool {
        self.config.wake_word_enabled
            && !self.wake_disabled
            && self.state().is_idle()
            && self.ctx.desktop.voice().current() == VoiceModality::Idle
    }

    fn start_wake_listener(&mut self) {
        if self.wake_cancel.is_some() || !self.wake_allowed() {
            return;
        }
        self.wake_generation += 1;
        let generation = self.wake_generation;
        let cancel = self.shutdown.child_token();
        self.wake_cancel = Some(cancel.clone());
        debug!(generation, "wake listener started");

        let recognizer = Arc::clone(&self.recognizer);
        let phrase = self.config.wake_phrase.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Some(error) = listen_for_wake(recognizer, &phrase, generation, cancel, &tx).await
            {
                let _ = tx.send(Event::WakeEnded {
                    generation,
                    error: Some(error),
                });
            }
        });
    }

    fn stop_wake_listener(&mut self) {
        if let Some(cancel) = self.wake_cancel.take() {
            cancel.cancel();
            // Outstanding restarts and results of the old listener are stale.
            self.wake_generation += 1;
            debug!("wake listener stopped");
        }
    }

    fn on_wake_ended(&mut self, generation: u64, error: Option<RecognitionError>) {
        if generation != self.wake_generation {
            return;
        }
        self.wake_cancel = None;
        match error {
            Some(RecognitionError::PermissionDenied) => {
                warn!("microphone permission denied, wake listening disabled");
                self.wake_disabled = true;
                self.ctx.desktop.alert(
                    error_codes::PERMISSION_DENIED,
                    "Microphone access is needed to hear the wake phrase.",
                );
                return;
            }
            Some(ref e) if !e.is_transient() => {
                warn!(error = %e, "wake listener failed, restarting");
            }
            _ => debug!("wake listener ended, restarting"),
        }
        self.schedule_wake_restart(generation);
    }

    /// Restart the listener after the configured delay unless something
    /// else started or stopped it in the meantime.
    fn schedule_wake_restart(&self, generation: u64) {
        let delay = Duration::from_millis(self.config.wake_restart_delay_ms);
        let cancel = self.shutdown.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(Event::RestartWake { generation });
                }
            }
        });
    }

    fn on_voice_changed(&mut self, modality: VoiceModality) {
        match modality {
            VoiceModality::Realtime => {
                info!("realtime session took the microphone");
                self.stop_wake_listener();
            }
            VoiceModality::Idle => self.start_wake_listener(),
            VoiceModality::Assistant => {}
        }
    }
}

/// Run one continuous recognition session looking for the wake phrase.
///
/// Returns `None` when the listener ended by detection or cancellation, and
/// the final error state otherwise (`Some(NoSpeech)` stands in for a clean
/// end so the caller restarts).
async fn listen_for_wake(
    recognizer: Arc<dyn SpeechRecognizer>,
    phrase: &str,
    generation: u64,
    cancel: CancellationToken,
    tx: &mpsc::UnboundedSender<Event>,
) -> Option<RecognitionError> {
    let mut events = match recognizer
        .listen(RecognitionMode::Continuous, cancel.clone())
        .await
    {
        Ok(events) => events,
        Err(DesktopError::PermissionDenied(_)) => return Some(RecognitionError::PermissionDenied),
        Err(e) => return Some(RecognitionError::Other(e.to_string())),
    };
    let mut last_error = None;
    loop {
        tokio::select! {
            () = cancel.cancelled() => return None,
            event = events.recv() => match event {
                Some(RecognitionEvent::Partial(text) | RecognitionEvent::Final(text)) => {
                    if find_wake_phrase(&text, phrase).is_some() {
                        cancel.cancel();
                        let _ = tx.send(Event::WakeDetected { generation });
                        return None;
                    }
                }
                Some(RecognitionEvent::Error(e)) => last_error = Some(e),
                Some(RecognitionEvent::Ended) | None => {
                    return Some(last_error.unwrap_or(RecognitionError::NoSpeech));
                }
            },
        }
    }
}

/// Run one one-shot recognition session and return the final transcript.
async fn capture_command(
    recognizer: Arc<dyn SpeechRecognizer>,
    cycle: u64,
    cancel: CancellationToken,
    tx: &mpsc::UnboundedSender<Event>,
) -> (String, Option<RecognitionError>) {
    let mut events = match recognizer
        .listen(RecognitionMode::OneShot, cancel.clone())
        .await
    {
        Ok(events) => events,
        Err(DesktopError::PermissionDenied(_)) => {
            return (String::new(), Some(RecognitionError::PermissionDenied));
        }
        Err(e) => return (String::new(), Some(RecognitionError::Other(e.to_string()))),
    };
    let mut finals: Vec<String> = Vec::new();
    let mut error = None;
    loop {
        tokio::select! {
            () = cancel.cancelled() => return (String::new(), Some(RecognitionError::Aborted)),
            event = events.recv() => match event {
                Some(RecognitionEvent::Partial(text)) => {
                    let mut shown = finals.join(" ");
                    if !shown.is_empty() {
                        shown.push(' ');
                    }
                    shown.push_str(&text);
                    let _ = tx.send(Event::CapturePartial { cycle, text: shown });
                }
                Some(RecognitionEvent::Final(text)) => {
                    finals.push(text.trim().to_owned());
                    let _ = tx.send(Event::CapturePartial { cycle, text: finals.join(" ") });
                }
                Some(RecognitionEvent::Error(e)) => error = Some(e),
                Some(RecognitionEvent::Ended) | None => break,
            },
        }
    }
    (finals.join(" "), error)
}

/// The two-round tool protocol.
///
/// Round one sends the utterance with the tool declarations. When the model
/// asks for a function, it is dispatched, the call and its result are
/// appended to the history, and round two asks for the spoken reply.
async fn respond(
    ctx: &ToolContext,
    tools: &ToolRegistry,
    mut history: ConversationHistory,
    utterance: String,
    fallback: String,
) -> Result<(String, ConversationHistory)> {
    let declarations: Vec<ToolDefinition> = tools.definitions();
    history.push_user(utterance);

    let first = ctx
        .gateway
        .respond_with_tools(history.turns(), &declarations)
        .await?;

    let reply = match first.function_call {
        Some(call) => {
            let input_json = call.args.to_string();
            info!(tool = %call.name, args = %input_json, "dispatching tool call");
            ctx.desktop.publish(DesktopEvent::ToolCall {
                name: call.name.clone(),
                input_json,
            });
            let result = tools.dispatch(ctx, &call.name, call.args.clone()).await;
            ctx.desktop.publish(DesktopEvent::ToolResult {
                name: call.name.clone(),
                success: result.success,
                output_text: result.content.clone(),
            });
            history.push_function_round(call, result.to_response());

            let second = ctx
                .gateway
                .respond_with_tools(history.turns(), &declarations)
                .await?;
            if let Some(extra) = &second.function_call {
                warn!(tool = %extra.name, "second-round function call ignored");
            }
            second
                .text
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| {
                    if result.content.is_empty() {
                        fallback
                    } else {
                        result.content
                    }
                })
        }
        None => first
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback),
    };
    history.push_model(reply.clone());
    Ok((reply, history))
}
