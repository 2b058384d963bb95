//! Realtime session lifecycle against a fake gateway connection.

use crate::helpers::{FakeAudio, FakeMicrophone, ScriptedGateway, desktop, drain, quiet_config, wait_until};
use base64::Engine as _;
use durgas::error::error_codes;
use durgas::gateway::{RealtimeEvent, ServerMessage};
use durgas::realtime::{RealtimeSessionManager, TranscriptTurn};
use durgas::voice::VoiceModality;
use durgas::{Desktop, DesktopError, DesktopEvent};
use std::sync::Arc;
use std::sync::atomic::Ordering;

struct Rig {
    desktop: Arc<Desktop>,
    gateway: Arc<ScriptedGateway>,
    mic: Arc<FakeMicrophone>,
    audio: Arc<FakeAudio>,
    manager: RealtimeSessionManager,
}

fn rig() -> Rig {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let mic = FakeMicrophone::new();
    let audio = FakeAudio::new();
    let manager = RealtimeSessionManager::new(
        Arc::clone(&desktop),
        gateway.clone(),
        mic.clone(),
        audio.clone(),
    );
    Rig {
        desktop,
        gateway,
        mic,
        audio,
        manager,
    }
}

fn message(input: Option<&str>, output: Option<&str>, turn_complete: bool) -> RealtimeEvent {
    RealtimeEvent::Message(ServerMessage {
        input_transcription: input.map(str::to_owned),
        output_transcription: output.map(str::to_owned),
        turn_complete,
        audio: None,
    })
}

fn audio_message(bytes: usize) -> RealtimeEvent {
    RealtimeEvent::Message(ServerMessage {
        audio: Some(base64::engine::general_purpose::STANDARD.encode(vec![0u8; bytes])),
        ..ServerMessage::default()
    })
}

async fn open(rig: &Rig) {
    rig.manager.start().await.unwrap();
    rig.gateway
        .realtime_events()
        .send(RealtimeEvent::Opened)
        .await
        .unwrap();
    wait_until("session active", || rig.manager.is_active()).await;
}

#[tokio::test]
async fn turns_accumulate_and_complete() {
    let rig = rig();
    let mut events = rig.desktop.subscribe();
    open(&rig).await;
    let server = rig.gateway.realtime_events();

    server.send(message(Some("What's "), None, false)).await.unwrap();
    server.send(message(Some("up?"), Some("Not much."), false)).await.unwrap();
    wait_until("partial", || rig.manager.status().current_output == "Not much.").await;
    assert_eq!(rig.manager.status().current_input, "What's up?");

    server.send(message(None, None, true)).await.unwrap();
    wait_until("turn", || rig.manager.transcripts().len() == 1).await;
    assert_eq!(
        rig.manager.transcripts()[0],
        TranscriptTurn {
            user: "What's up?".into(),
            model: "Not much.".into(),
        }
    );
    assert_eq!(rig.manager.status().current_input, "");

    let published = drain(&mut events);
    assert!(
        published
            .iter()
            .any(|e| matches!(e, DesktopEvent::RealtimeActive { active: true }))
    );
    assert!(
        published
            .iter()
            .any(|e| matches!(e, DesktopEvent::RealtimeTurn(t) if t.model == "Not much."))
    );
    rig.manager.stop().await;
}

#[tokio::test]
async fn audio_chunks_play_back_to_back() {
    let rig = rig();
    rig.audio.set_clock(2.0);
    open(&rig).await;
    let server = rig.gateway.realtime_events();

    // 4800 bytes of PCM16 at 24 kHz is 0.1 s.
    server.send(audio_message(4800)).await.unwrap();
    server.send(audio_message(4800)).await.unwrap();
    wait_until("two clips", || rig.audio.scheduled().len() == 2).await;

    let clips = rig.audio.scheduled();
    assert!((clips[0].0 - 2.0).abs() < 1e-9);
    assert!((clips[1].0 - 2.1).abs() < 1e-9);
    rig.manager.stop().await;
}

#[tokio::test]
async fn microphone_audio_is_framed_and_sent() {
    let rig = rig();
    open(&rig).await;

    let feed = rig.mic.feed();
    feed.send(vec![0.25; 3000]).await.unwrap();
    feed.send(vec![0.25; 3000]).await.unwrap();
    wait_until("one frame", || rig.gateway.connection.frames().len() == 1).await;

    let frame = &rig.gateway.connection.frames()[0];
    assert_eq!(frame.mime_type, "audio/pcm;rate=16000");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&frame.data)
        .unwrap();
    assert_eq!(bytes.len(), 4096 * 2);
    rig.manager.stop().await;
}

#[tokio::test]
async fn server_close_tears_everything_down() {
    let rig = rig();
    open(&rig).await;
    assert_eq!(rig.desktop.voice().current(), VoiceModality::Realtime);

    rig.gateway
        .realtime_events()
        .send(RealtimeEvent::Closed)
        .await
        .unwrap();
    wait_until("inactive", || !rig.manager.is_active()).await;
    wait_until("lease released", || {
        rig.desktop.voice().current() == VoiceModality::Idle
    })
    .await;
    assert!(rig.gateway.connection.is_closed());
    assert!(rig.audio.stops.load(Ordering::SeqCst) >= 1);
    wait_until("mic released", || rig.mic.is_released()).await;
}

#[tokio::test]
async fn microphone_denial_alerts_and_releases_the_lease() {
    let rig = rig();
    rig.mic.deny.store(true, Ordering::SeqCst);
    let mut events = rig.desktop.subscribe();

    let err = rig.manager.start().await.unwrap_err();
    assert!(matches!(err, DesktopError::PermissionDenied(_)));
    assert_eq!(rig.desktop.voice().current(), VoiceModality::Idle);
    assert!(!rig.manager.status().starting);

    let alerted = drain(&mut events).into_iter().any(|e| {
        matches!(e, DesktopEvent::Alert { ref code, .. } if code == error_codes::PERMISSION_DENIED)
    });
    assert!(alerted);
}

#[tokio::test]
async fn gateway_refusal_leaves_nothing_behind() {
    let rig = rig();
    rig.gateway.refuse_realtime.store(true, Ordering::SeqCst);
    let err = rig.manager.start().await.unwrap_err();
    assert!(matches!(err, DesktopError::Gateway(_)));
    assert_eq!(rig.desktop.voice().current(), VoiceModality::Idle);
    assert!(rig.mic.is_released());
}

#[tokio::test]
async fn stop_is_idempotent_and_start_is_exclusive() {
    let rig = rig();
    rig.manager.stop().await;

    open(&rig).await;
    let second = rig.manager.start().await.unwrap_err();
    assert!(matches!(second, DesktopError::VoiceBusy(_)));

    rig.manager.stop().await;
    assert!(rig.mic.is_released(), "microphone held after stop returned");
    rig.manager.stop().await;
    assert!(!rig.manager.is_active());
    assert!(rig.gateway.connection.is_closed());
    assert_eq!(rig.desktop.voice().current(), VoiceModality::Idle);
}

#[tokio::test]
async fn assistant_cycle_blocks_realtime_start() {
    let rig = rig();
    let lease = rig
        .desktop
        .voice()
        .try_acquire(VoiceModality::Assistant)
        .unwrap();
    assert!(matches!(
        rig.manager.start().await,
        Err(DesktopError::VoiceBusy(_))
    ));
    drop(lease);
    open(&rig).await;
    rig.manager.stop().await;
}

#[tokio::test]
async fn stop_while_connecting_discards_the_late_connection() {
    let rig = rig();
    let release = rig.gateway.hold_realtime();
    let manager = rig.manager.clone();
    let starting = tokio::spawn(async move { manager.start().await });
    wait_until("gateway reached", || {
        rig.gateway.realtime_opens.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(rig.manager.status().starting);

    rig.manager.stop().await;
    assert_eq!(rig.desktop.voice().current(), VoiceModality::Idle);
    release.send(()).unwrap();

    let outcome = starting.await.unwrap();
    assert!(matches!(outcome, Err(DesktopError::SessionClosed(_))));
    assert!(rig.gateway.connection.is_closed());
    assert!(rig.mic.is_released());
    assert!(!rig.manager.is_active());
    assert_eq!(rig.desktop.voice().current(), VoiceModality::Idle);
}
