//! Host command channel wired to a full desktop with fake voice services.

use crate::helpers::{
    FakeAudio, FakeMicrophone, Script, ScriptedGateway, ScriptedRecognizer, desktop, quiet_config,
};
use durgas::assistant::AssistantCoordinator;
use durgas::gateway::RealtimeEvent;
use durgas::host::{
    CommandEnvelope, CommandName, DesktopHost, HostCommandClient, ResponseEnvelope,
    command_channel,
};
use durgas::platform::RecognitionMode;
use durgas::realtime::RealtimeSessionManager;
use serde_json::{Value, json};
use std::sync::Arc;

struct Bridge {
    client: HostCommandClient,
    gateway: Arc<ScriptedGateway>,
    host: Arc<DesktopHost>,
}

fn bridge() -> Bridge {
    let desktop = desktop(quiet_config());
    let gateway = ScriptedGateway::new();
    let recognizer = ScriptedRecognizer::new();
    recognizer.script(RecognitionMode::OneShot, Script::Hold);
    let audio = FakeAudio::new();
    let assistant = AssistantCoordinator::new(
        Arc::clone(&desktop),
        gateway.clone(),
        recognizer,
        audio.clone(),
    )
    .spawn();
    let realtime = RealtimeSessionManager::new(
        Arc::clone(&desktop),
        gateway.clone(),
        FakeMicrophone::new(),
        audio,
    );
    let host = Arc::new(
        DesktopHost::new(desktop)
            .with_assistant(assistant)
            .with_realtime(realtime),
    );
    let (client, server) = command_channel(8, 64, Arc::clone(&host));
    tokio::spawn(server.run());
    Bridge {
        client,
        gateway,
        host,
    }
}

async fn send(bridge: &Bridge, command: CommandName, payload: Value) -> ResponseEnvelope {
    bridge
        .client
        .send(CommandEnvelope::new("req", command, payload))
        .await
        .expect("host responds")
}

#[tokio::test]
async fn explorer_workflow_over_the_channel() {
    let bridge = bridge();
    let created = send(
        &bridge,
        CommandName::FsCreateFile,
        json!({"path": "Users/Durgas/Desktop", "name": "notes.txt", "content": "buy milk"}),
    )
    .await;
    assert_eq!(created.payload["created"], true);

    let renamed = send(
        &bridge,
        CommandName::FsRename,
        json!({"path": "Users/Durgas/Desktop", "old_name": "notes.txt", "new_name": "todo.txt"}),
    )
    .await;
    assert!(renamed.ok, "{:?}", renamed.error);

    let opened = send(
        &bridge,
        CommandName::FsOpen,
        json!({"path": "Users/Durgas/Desktop/todo.txt"}),
    )
    .await;
    assert!(opened.ok);
    let list = send(&bridge, CommandName::WindowList, Value::Null).await;
    let notepad = list.payload["windows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["appId"] == "notepad")
        .cloned()
        .expect("notepad window");
    assert_eq!(notepad["data"]["content"], "buy milk");

    let search = send(&bridge, CommandName::FsSearch, json!({"query": "todo"})).await;
    assert_eq!(search.payload["files"].as_array().unwrap().len(), 1);

    let deleted = send(
        &bridge,
        CommandName::FsDelete,
        json!({"path": "Users/Durgas/Desktop", "name": "todo.txt"}),
    )
    .await;
    assert_eq!(deleted.payload["deleted"], true);
}

#[tokio::test]
async fn dragging_a_window_moves_it() {
    let bridge = bridge();
    let open = send(&bridge, CommandName::WindowOpen, json!({"app_id": "settings"})).await;
    let id = open.payload["window_id"].as_str().unwrap().to_owned();
    let window_id = durgas::window::WindowId::new(id.clone());
    let before = bridge.host.desktop().windows().get(&window_id).unwrap();

    let down = send(
        &bridge,
        CommandName::WindowPointerDown,
        json!({"window_id": id, "target": {"kind": "header"}, "x": 10.0, "y": 10.0}),
    )
    .await;
    assert_eq!(down.payload["gesture"], true, "{:?}", down.error);
    send(&bridge, CommandName::WindowPointerMove, json!({"x": 60.0, "y": 40.0})).await;
    send(&bridge, CommandName::WindowPointerUp, Value::Null).await;

    let after = bridge.host.desktop().windows().get(&window_id).unwrap();
    assert_eq!(after.x, before.x + 50.0);
    assert_eq!(after.y, before.y + 30.0);
    assert_eq!(after.width, before.width);
}

#[tokio::test]
async fn voice_commands_reach_their_services() {
    let bridge = bridge();
    let activated = send(&bridge, CommandName::AssistantActivate, Value::Null).await;
    assert_eq!(activated.payload["outcome"], "started");
    assert_eq!(activated.payload["state"], "listening");

    // The assistant holds the microphone, so realtime must wait.
    let refused = send(&bridge, CommandName::RealtimeStart, Value::Null).await;
    assert!(!refused.ok);
    assert_eq!(refused.payload["code"], "VOICE_BUSY");
}

#[tokio::test]
async fn realtime_status_and_shutdown() {
    let bridge = bridge();
    let started = send(&bridge, CommandName::RealtimeStart, Value::Null).await;
    assert!(started.ok, "{:?}", started.error);
    bridge
        .gateway
        .realtime_events()
        .send(RealtimeEvent::Opened)
        .await
        .unwrap();
    let mut status = send(&bridge, CommandName::RealtimeStatus, Value::Null).await;
    for _ in 0..200 {
        if status.payload["status"]["active"] == true {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        status = send(&bridge, CommandName::RealtimeStatus, Value::Null).await;
    }
    assert_eq!(status.payload["status"]["active"], true);
    assert!(status.payload["transcripts"].as_array().unwrap().is_empty());

    let token = bridge.host.shutdown_token();
    let bye = send(&bridge, CommandName::HostShutdown, Value::Null).await;
    assert_eq!(bye.payload["stopping"], true);
    assert!(token.is_cancelled());
    assert!(bridge.gateway.connection.is_closed());
}
