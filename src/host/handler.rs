//! Command routing onto the desktop.
//!
//! [`DesktopHost`] owns handles to the desktop, the assistant and the
//! realtime session manager, and turns each [`CommandEnvelope`] into a
//! [`ResponseEnvelope`].

use crate::assistant::{Activation, AssistantHandle};
use crate::desktop::Desktop;
use crate::error::{DesktopError, Result};
use crate::host::contract::{CommandEnvelope, CommandName, EVENT_VERSION, ResponseEnvelope};
use crate::realtime::RealtimeSessionManager;
use crate::settings::{AccentColor, Theme};
use crate::shell::ShellSession;
use crate::vfs::{FileSystemNode, VfsPath};
use crate::window::{HitTarget, Point, WindowData, WindowId, WindowPatch, search_apps};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct DesktopHost {
    desktop: Arc<Desktop>,
    assistant: Option<AssistantHandle>,
    realtime: Option<RealtimeSessionManager>,
    terminals: Mutex<HashMap<WindowId, ShellSession>>,
    shutdown: CancellationToken,
}

#[derive(Deserialize)]
struct WindowOpenPayload {
    app_id: String,
    #[serde(default)]
    data: WindowData,
}

#[derive(Deserialize)]
struct WindowUpdatePayload {
    window_id: String,
    patch: WindowPatch,
}

#[derive(Deserialize)]
struct PointerDownPayload {
    window_id: String,
    target: HitTarget,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct PointerPayload {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct FsGetPayload {
    #[serde(default)]
    path: String,
    #[serde(default)]
    fallback_to_root: bool,
}

#[derive(Deserialize)]
struct FsCreatePayload {
    #[serde(default)]
    path: String,
    name: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct FsRenamePayload {
    #[serde(default)]
    path: String,
    old_name: String,
    new_name: String,
}

#[derive(Deserialize)]
struct FsDeletePayload {
    #[serde(default)]
    path: String,
    name: String,
}

#[derive(Deserialize)]
struct TerminalExecPayload {
    window_id: String,
    #[serde(default)]
    line: String,
}

impl DesktopHost {
    pub fn new(desktop: Arc<Desktop>) -> Self {
        Self {
            desktop,
            assistant: None,
            realtime: None,
            terminals: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_assistant(mut self, assistant: AssistantHandle) -> Self {
        self.assistant = Some(assistant);
        self
    }

    #[must_use]
    pub fn with_realtime(mut self, realtime: RealtimeSessionManager) -> Self {
        self.realtime = Some(realtime);
        self
    }

    pub fn desktop(&self) -> &Arc<Desktop> {
        &self.desktop
    }

    /// Cancelled once `host.shutdown` has been handled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Route one command. Failures become error envelopes carrying the
    /// stable error code.
    pub async fn route(&self, envelope: &CommandEnvelope) -> ResponseEnvelope {
        let request_id = envelope.request_id.clone();
        match self.dispatch(envelope).await {
            Ok(payload) => ResponseEnvelope::ok(request_id, payload),
            Err(e) => {
                debug!(
                    command = envelope.command.as_str(),
                    code = e.code(),
                    error = %e,
                    "host command failed"
                );
                ResponseEnvelope::from_error(request_id, &e)
            }
        }
    }

    async fn dispatch(&self, envelope: &CommandEnvelope) -> Result<serde_json::Value> {
        let payload = &envelope.payload;
        let command = envelope.command.as_str();
        match envelope.command {
            CommandName::HostPing => Ok(serde_json::json!({"pong": true})),
            CommandName::HostVersion => Ok(serde_json::json!({
                "contract_version": EVENT_VERSION,
                "package_version": env!("CARGO_PKG_VERSION"),
            })),
            CommandName::HostShutdown => {
                self.shut_down().await;
                Ok(serde_json::json!({"stopping": true}))
            }
            CommandName::WindowList => Ok(self.window_list()),
            CommandName::WindowOpen => {
                let p: WindowOpenPayload = parse_payload(payload, command)?;
                let id = self.desktop.windows().open_app(&p.app_id, p.data).ok_or_else(|| {
                    DesktopError::InvalidInput(format!("unknown app: {}", p.app_id))
                })?;
                Ok(serde_json::json!({"window_id": id}))
            }
            CommandName::WindowClose => {
                let id = parse_window_id(payload, command)?;
                let closed = self.desktop.windows().close(&id);
                self.lock_terminals().remove(&id);
                Ok(serde_json::json!({"closed": closed}))
            }
            CommandName::WindowMinimize => {
                let id = parse_window_id(payload, command)?;
                Ok(serde_json::json!({"minimized": self.desktop.windows().minimize(&id)}))
            }
            CommandName::WindowFocus => {
                let id = parse_window_id(payload, command)?;
                Ok(serde_json::json!({"focused": self.desktop.windows().focus(&id)}))
            }
            CommandName::WindowUpdate => {
                let p: WindowUpdatePayload = parse_payload(payload, command)?;
                let updated = self
                    .desktop
                    .windows()
                    .update(&WindowId::new(p.window_id), &p.patch);
                Ok(serde_json::json!({"updated": updated}))
            }
            CommandName::WindowPointerDown => {
                let p: PointerDownPayload = parse_payload(payload, command)?;
                let started = self.desktop.windows().pointer_down(
                    &WindowId::new(p.window_id),
                    p.target,
                    Point::new(p.x, p.y),
                );
                Ok(serde_json::json!({"gesture": started}))
            }
            CommandName::WindowPointerMove => {
                let p: PointerPayload = parse_payload(payload, command)?;
                self.desktop.windows().pointer_move(Point::new(p.x, p.y));
                Ok(serde_json::json!({"gesture": self.desktop.windows().gesture_active()}))
            }
            CommandName::WindowPointerUp => {
                self.desktop.windows().pointer_up();
                Ok(serde_json::json!({"gesture": false}))
            }
            CommandName::FsGet => {
                let p: FsGetPayload = parse_payload(payload, command)?;
                let path = VfsPath::parse(&p.path);
                let (path, node) = if p.fallback_to_root {
                    self.desktop.fs().resolve_or_root(&path)
                } else {
                    let node = self.desktop.fs().resolve(&path)?;
                    (path, node)
                };
                Ok(serde_json::json!({"path": path, "node": node}))
            }
            CommandName::FsCreateFolder => {
                let p: FsCreatePayload = parse_payload(payload, command)?;
                let path = VfsPath::parse(&p.path);
                Ok(self.created(self.desktop.fs().create_folder(&path, &p.name)))
            }
            CommandName::FsCreateFile => {
                let p: FsCreatePayload = parse_payload(payload, command)?;
                let name = crate::vfs::validate_name(&p.name)?;
                let path = VfsPath::parse(&p.path);
                let file = FileSystemNode::file(name, p.content);
                let result = self
                    .desktop
                    .fs()
                    .create(&path, file.clone())
                    .map(|()| file);
                Ok(self.created(result))
            }
            CommandName::FsRename => {
                let p: FsRenamePayload = parse_payload(payload, command)?;
                let path = VfsPath::parse(&p.path);
                self.desktop
                    .fs()
                    .rename(&path, &p.old_name, &p.new_name)
                    .inspect_err(|e| self.desktop.alert(e.code(), e.to_string()))?;
                Ok(serde_json::json!({"renamed": true}))
            }
            CommandName::FsDelete => {
                let p: FsDeletePayload = parse_payload(payload, command)?;
                let deleted = self
                    .desktop
                    .fs()
                    .delete(&VfsPath::parse(&p.path), &p.name)?;
                Ok(serde_json::json!({"deleted": deleted}))
            }
            CommandName::FsSearch => {
                let query = payload
                    .get("query")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default();
                Ok(serde_json::json!({
                    "apps": search_apps(query),
                    "files": self.desktop.fs().search(query),
                }))
            }
            CommandName::FsOpen => {
                let path = parse_non_empty_field(payload, "path", command)?;
                let id = self.desktop.open_path(&VfsPath::parse(&path))?;
                Ok(serde_json::json!({"window_id": id}))
            }
            CommandName::TerminalExec => {
                let p: TerminalExecPayload = parse_payload(payload, command)?;
                self.terminal_exec(WindowId::new(p.window_id), &p.line)
            }
            CommandName::SettingsGet => to_json(&*self.desktop.appearance()),
            CommandName::SettingsSetTheme => {
                let raw = parse_non_empty_field(payload, "theme", command)?;
                let theme = Theme::parse(&raw).ok_or_else(|| {
                    DesktopError::InvalidInput(format!("unknown theme: {raw}"))
                })?;
                to_json(&*self.desktop.set_theme(theme))
            }
            CommandName::SettingsSetWallpaper => {
                let wallpaper = parse_non_empty_field(payload, "wallpaper", command)?;
                to_json(&*self.desktop.set_wallpaper(wallpaper)?)
            }
            CommandName::SettingsSetAccent => {
                let accent: AccentColor = parse_payload(payload, command)?;
                to_json(&*self.desktop.set_accent(accent)?)
            }
            CommandName::AssistantStatus => {
                let assistant = self.assistant()?;
                Ok(serde_json::json!({
                    "state": assistant.state(),
                    "transcript": assistant.transcript(),
                }))
            }
            CommandName::AssistantActivate => {
                let assistant = self.assistant()?;
                let outcome = match assistant.activate().await? {
                    Activation::Started => "started",
                    Activation::AlreadyActive(_) => "already_active",
                    Activation::Refused => "refused",
                };
                Ok(serde_json::json!({
                    "outcome": outcome,
                    "state": assistant.state(),
                }))
            }
            CommandName::RealtimeStatus => {
                let realtime = self.realtime()?;
                Ok(serde_json::json!({
                    "status": realtime.status(),
                    "transcripts": *realtime.transcripts(),
                }))
            }
            CommandName::RealtimeStart => {
                self.realtime()?.start().await?;
                Ok(serde_json::json!({"started": true}))
            }
            CommandName::RealtimeStop => {
                self.realtime()?.stop().await;
                Ok(serde_json::json!({"stopped": true}))
            }
        }
    }

    fn assistant(&self) -> Result<&AssistantHandle> {
        self.assistant
            .as_ref()
            .ok_or_else(|| DesktopError::InvalidInput("assistant is not configured".into()))
    }

    fn realtime(&self) -> Result<&RealtimeSessionManager> {
        self.realtime
            .as_ref()
            .ok_or_else(|| DesktopError::InvalidInput("realtime sessions are not configured".into()))
    }

    fn window_list(&self) -> serde_json::Value {
        let windows = self.desktop.windows().windows();
        serde_json::json!({
            "windows": *windows,
            "active_window_id": crate::window::active_window_id(&windows),
        })
    }

    /// Create results are reported as `created: bool`; collisions and bad
    /// names also raise an inline alert.
    fn created(&self, result: Result<FileSystemNode>) -> serde_json::Value {
        match result {
            Ok(node) => serde_json::json!({"created": true, "node": node}),
            Err(e) => {
                self.desktop.alert(e.code(), e.to_string());
                serde_json::json!({"created": false, "code": e.code(), "reason": e.to_string()})
            }
        }
    }

    fn terminal_exec(&self, window_id: WindowId, line: &str) -> Result<serde_json::Value> {
        let Some(window) = self.desktop.windows().get(&window_id) else {
            return Err(DesktopError::InvalidInput(format!(
                "no such window: {window_id}"
            )));
        };
        if window.app_id != crate::window::catalog::TERMINAL {
            return Err(DesktopError::InvalidInput(format!(
                "window {window_id} is not a terminal"
            )));
        }
        let snapshot = self.desktop.fs().snapshot();
        let mut terminals = self.lock_terminals();
        // Forget sessions whose window has been closed.
        let open = self.desktop.windows().windows();
        terminals.retain(|id, _| open.iter().any(|w| &w.id == id));
        let session = terminals
            .entry(window_id)
            .or_insert_with(|| ShellSession::new(snapshot.root_name()));
        let output = session.execute(&snapshot, line);
        Ok(serde_json::json!({
            "lines": output.lines,
            "clear": output.clear,
            "prompt": session.prompt(),
        }))
    }

    fn lock_terminals(&self) -> std::sync::MutexGuard<'_, HashMap<WindowId, ShellSession>> {
        self.terminals.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn shut_down(&self) {
        info!("host shutdown requested");
        if let Some(realtime) = &self.realtime {
            realtime.stop().await;
        }
        if let Some(assistant) = &self.assistant {
            assistant.shutdown();
        }
        self.shutdown.cancel();
    }
}

fn parse_payload<T: DeserializeOwned>(payload: &serde_json::Value, command: &str) -> Result<T> {
    let value = if payload.is_null() {
        serde_json::json!({})
    } else {
        payload.clone()
    };
    serde_json::from_value(value)
        .map_err(|e| DesktopError::InvalidInput(format!("{command}: invalid payload: {e}")))
}

fn parse_non_empty_field(payload: &serde_json::Value, field: &str, command: &str) -> Result<String> {
    let Some(raw) = payload.get(field).and_then(serde_json::Value::as_str) else {
        return Err(DesktopError::InvalidInput(format!(
            "{command} requires payload.{field}"
        )));
    };
    let value = raw.trim();
    if value.is_empty() {
        return Err(DesktopError::InvalidInput(format!(
            "{command} requires a non-empty payload.{field}"
        )));
    }
    Ok(value.to_owned())
}

fn parse_window_id(payload: &serde_json::Value, command: &str) -> Result<WindowId> {
    parse_non_empty_field(payload, "window_id", command).map(WindowId::new)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| DesktopError::Channel(format!("failed to serialize payload: {e}")))
}
