//! End-to-end assistant cycles against scripted speech and gateway fakes.

use crate::helpers::{
    FakeAudio, Script, ScriptedGateway, ScriptedRecognizer, desktop, drain, quiet_config,
    wait_until,
};
use durgas::assistant::{Activation, AssistantCoordinator, AssistantState};
use durgas::error::error_codes;
use durgas::gateway::{Role, ToolResponse, TurnPart};
use durgas::platform::{RecognitionError, RecognitionEvent, RecognitionMode};
use durgas::voice::VoiceModality;
use durgas::{DesktopError, DesktopEvent};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn capture(text: &str) -> Script {
    Script::Events(vec![
        RecognitionEvent::Partial(text.to_owned()),
        RecognitionEvent::Final(text.to_owned()),
        RecognitionEvent::Ended,
    ])
}

#[tokio::test]
async fn open_app_call_is_confirmed_before_the_spoken_reply() {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    let audio = FakeAudio::new();
    gateway.push_reply(Ok(ToolResponse::call(
        "openApp",
        serde_json::json!({"appName": "terminal"}),
    )));
    gateway.push_reply(Ok(ToolResponse::text("The terminal is open.")));
    recognizer.script(RecognitionMode::OneShot, capture("open the terminal"));

    let handle = AssistantCoordinator::new(
        Arc::clone(&desktop),
        gateway.clone(),
        recognizer.clone(),
        audio.clone(),
    )
    .spawn();

    assert_eq!(handle.activate().await.unwrap(), Activation::Started);
    wait_until("spoken reply", || gateway.spoke("The terminal is open.")).await;
    wait_until("idle", || handle.state() == AssistantState::Idle).await;

    let windows = desktop.windows().windows();
    assert!(windows.iter().any(|w| w.app_id == "terminal"));

    let requests = gateway.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    let second = &requests[1];
    assert_eq!(second[0].text(), Some("open the terminal"));
    assert!(matches!(
        &second[1].part,
        TurnPart::FunctionCall { call } if call.name == "openApp"
    ));
    match &second[2].part {
        TurnPart::FunctionResponse { name, response } => {
            assert_eq!(second[2].role, Role::Tool);
            assert_eq!(name, "openApp");
            assert_eq!(response["result"], "Opened Terminal.");
        }
        other => panic!("expected a function response, got {other:?}"),
    }
    assert_eq!(handle.transcript(), "open the terminal");
    handle.shutdown();
}

#[tokio::test]
async fn plain_text_reply_is_spoken() {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    let audio = FakeAudio::new();
    gateway.push_reply(Ok(ToolResponse::text("Hello there.")));
    recognizer.script(RecognitionMode::OneShot, capture("hello"));
    let mut events = desktop.subscribe();

    let handle =
        AssistantCoordinator::new(desktop.clone(), gateway.clone(), recognizer, audio.clone())
            .spawn();
    handle.activate().await.unwrap();
    wait_until("reply", || gateway.spoke("Hello there.")).await;
    wait_until("idle", || handle.state() == AssistantState::Idle).await;

    let states: Vec<AssistantState> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            DesktopEvent::AssistantState { state } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        [
            AssistantState::Listening,
            AssistantState::Thinking,
            AssistantState::Speaking,
            AssistantState::Idle,
        ]
    );
    assert_eq!(audio.played.lock().unwrap().len(), 1);
    assert_eq!(desktop.voice().current(), VoiceModality::Idle);
    handle.shutdown();
}

#[tokio::test]
async fn failed_speech_still_returns_to_idle() {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    gateway.fail_tts.store(true, Ordering::SeqCst);
    let recognizer = ScriptedRecognizer::new();
    let audio = FakeAudio::new();
    gateway.push_reply(Ok(ToolResponse::text("You will not hear this.")));
    recognizer.script(RecognitionMode::OneShot, capture("say something"));
    let mut events = desktop.subscribe();

    let handle =
        AssistantCoordinator::new(desktop.clone(), gateway.clone(), recognizer, audio.clone())
            .spawn();
    handle.activate().await.unwrap();
    wait_until("speech attempted", || gateway.spoke("You will not hear this.")).await;
    wait_until("idle", || handle.state() == AssistantState::Idle).await;

    let states: Vec<AssistantState> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            DesktopEvent::AssistantState { state } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        &states[states.len() - 2..],
        [AssistantState::Speaking, AssistantState::Idle]
    );
    assert!(!states.contains(&AssistantState::Error));
    assert!(audio.played.lock().unwrap().is_empty());
    assert_eq!(desktop.voice().current(), VoiceModality::Idle);
    handle.shutdown();
}

#[tokio::test]
async fn activation_during_realtime_is_refused_without_state_change() {
    let mut config = quiet_config();
    config.assistant.wake_word_enabled = true;
    let desktop = desktop(config);
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    let audio = FakeAudio::new();

    let handle = AssistantCoordinator::new(
        desktop.clone(),
        gateway.clone(),
        recognizer.clone(),
        audio,
    )
    .spawn();
    wait_until("wake listener", || recognizer.continuous_calls() == 1).await;

    let lease = desktop.voice().try_acquire(VoiceModality::Realtime).unwrap();
    wait_until("wake listener stopped", || recognizer.all_cancelled()).await;

    let busy = desktop.config().assistant.busy_message.clone();
    assert_eq!(handle.activate().await.unwrap(), Activation::Refused);
    wait_until("busy message", || gateway.spoke(&busy)).await;
    assert_eq!(handle.state(), AssistantState::Idle);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recognizer.continuous_calls(), 1, "wake listener restarted");
    assert_eq!(gateway.request_count(), 0);

    // Ending the realtime session resumes wake listening.
    drop(lease);
    wait_until("wake listener resumed", || recognizer.continuous_calls() == 2).await;
    handle.shutdown();
}

#[tokio::test]
async fn gateway_failure_enters_error_and_recovers() {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    gateway.push_reply(Err(DesktopError::Gateway("quota exceeded".into())));
    recognizer.script(RecognitionMode::OneShot, capture("what's the weather"));
    let mut events = desktop.subscribe();

    let handle =
        AssistantCoordinator::new(desktop.clone(), gateway.clone(), recognizer, FakeAudio::new())
            .spawn();
    handle.activate().await.unwrap();

    let apology = desktop.config().assistant.error_message.clone();
    wait_until("apology", || gateway.spoke(&apology)).await;
    wait_until("recovered", || handle.state() == AssistantState::Idle).await;

    let saw_error = drain(&mut events).into_iter().any(|e| {
        matches!(
            e,
            DesktopEvent::AssistantState {
                state: AssistantState::Error
            }
        )
    });
    assert!(saw_error);
    assert_eq!(desktop.voice().current(), VoiceModality::Idle);

    // The next cycle starts from a clean slate.
    assert_eq!(handle.activate().await.unwrap(), Activation::Started);
    handle.shutdown();
}

#[tokio::test]
async fn capture_error_goes_through_error_state() {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    recognizer.script(
        RecognitionMode::OneShot,
        Script::Events(vec![
            RecognitionEvent::Error(RecognitionError::Other("network".into())),
            RecognitionEvent::Ended,
        ]),
    );
    let handle =
        AssistantCoordinator::new(desktop.clone(), gateway.clone(), recognizer, FakeAudio::new())
            .spawn();
    handle.activate().await.unwrap();

    let apology = desktop.config().assistant.error_message.clone();
    wait_until("apology", || gateway.spoke(&apology)).await;
    wait_until("recovered", || handle.state() == AssistantState::Idle).await;
    assert_eq!(gateway.request_count(), 0);
    handle.shutdown();
}

#[tokio::test]
async fn silence_returns_to_idle_without_a_request() {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    recognizer.script(RecognitionMode::OneShot, Script::Events(vec![RecognitionEvent::Ended]));
    let handle =
        AssistantCoordinator::new(desktop.clone(), gateway.clone(), recognizer, FakeAudio::new())
            .spawn();

    handle.activate().await.unwrap();
    wait_until("idle", || handle.state() == AssistantState::Idle).await;
    assert_eq!(gateway.request_count(), 0);
    assert!(gateway.spoken.lock().unwrap().is_empty());
    handle.shutdown();
}

#[tokio::test]
async fn second_activation_while_listening_is_ignored() {
    let desktop = desktop(quiet_config());
    let recognizer = ScriptedRecognizer::new();
    recognizer.script(RecognitionMode::OneShot, Script::Hold);
    let handle = AssistantCoordinator::new(
        desktop,
        ScriptedGateway::new(),
        recognizer,
        FakeAudio::new(),
    )
    .spawn();

    assert_eq!(handle.activate().await.unwrap(), Activation::Started);
    assert_eq!(
        handle.activate().await.unwrap(),
        Activation::AlreadyActive(AssistantState::Listening)
    );
    handle.shutdown();
    wait_until("actor stopped", || !handle.is_running()).await;
    assert!(matches!(
        handle.activate().await,
        Err(DesktopError::SessionClosed(_))
    ));
}

#[tokio::test]
async fn wake_phrase_starts_a_cycle_and_listening_resumes() {
    let mut config = quiet_config();
    config.assistant.wake_word_enabled = true;
    let desktop = desktop(config);
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    recognizer.script(
        RecognitionMode::Continuous,
        Script::Events(vec![
            RecognitionEvent::Partial("so anyway".into()),
            RecognitionEvent::Partial("so anyway Hey Durgas".into()),
        ]),
    );
    recognizer.script(RecognitionMode::OneShot, capture("what time is it"));
    gateway.push_reply(Ok(ToolResponse::text("It is noon.")));

    let handle = AssistantCoordinator::new(
        desktop,
        gateway.clone(),
        recognizer.clone(),
        FakeAudio::new(),
    )
    .spawn();

    wait_until("reply", || gateway.spoke("It is noon.")).await;
    wait_until("idle", || handle.state() == AssistantState::Idle).await;
    wait_until("wake listener restarted", || recognizer.continuous_calls() >= 2).await;
    handle.shutdown();
}

#[tokio::test]
async fn wake_permission_denied_disables_listening_and_alerts() {
    let mut config = quiet_config();
    config.assistant.wake_word_enabled = true;
    let desktop = desktop(config);
    let mut events = desktop.subscribe();
    let recognizer = ScriptedRecognizer::new();
    recognizer.script(RecognitionMode::Continuous, Script::Deny);

    let handle = AssistantCoordinator::new(
        desktop,
        ScriptedGateway::new(),
        recognizer.clone(),
        FakeAudio::new(),
    )
    .spawn();

    wait_until("wake attempt", || recognizer.continuous_calls() == 1).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(recognizer.continuous_calls(), 1, "listener retried after denial");

    let alerted = drain(&mut events).into_iter().any(|e| {
        matches!(e, DesktopEvent::Alert { ref code, .. } if code == error_codes::PERMISSION_DENIED)
    });
    assert!(alerted);
    handle.shutdown();
}
