//! Versioned host command/event envelopes for the UI shell.

use crate::error::DesktopError;
use serde::{Deserialize, Serialize};

/// Contract version for host command/event envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Command set understood by the desktop host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "host.version")]
    HostVersion,
    #[serde(rename = "host.shutdown")]
    HostShutdown,
    #[serde(rename = "window.list")]
    WindowList,
    #[serde(rename = "window.open")]
    WindowOpen,
    #[serde(rename = "window.close")]
    WindowClose,
    #[serde(rename = "window.minimize")]
    WindowMinimize,
    #[serde(rename = "window.focus")]
    WindowFocus,
    #[serde(rename = "window.update")]
    WindowUpdate,
    #[serde(rename = "window.pointer_down")]
    WindowPointerDown,
    #[serde(rename = "window.pointer_move")]
    WindowPointerMove,
    #[serde(rename = "window.pointer_up")]
    WindowPointerUp,
    #[serde(rename = "fs.get")]
    FsGet,
    #[serde(rename = "fs.create_folder")]
    FsCreateFolder,
    #[serde(rename = "fs.create_file")]
    FsCreateFile,
    #[serde(rename = "fs.rename")]
    FsRename,
    #[serde(rename = "fs.delete")]
    FsDelete,
    #[serde(rename = "fs.search")]
    FsSearch,
    #[serde(rename = "fs.open")]
    FsOpen,
    #[serde(rename = "terminal.exec")]
    TerminalExec,
    #[serde(rename = "settings.get")]
    SettingsGet,
    #[serde(rename = "settings.set_theme")]
    SettingsSetTheme,
    #[serde(rename = "settings.set_wallpaper")]
    SettingsSetWallpaper,
    #[serde(rename = "settings.set_accent")]
    SettingsSetAccent,
    #[serde(rename = "assistant.status")]
    AssistantStatus,
    #[serde(rename = "assistant.activate")]
    AssistantActivate,
    #[serde(rename = "realtime.status")]
    RealtimeStatus,
    #[serde(rename = "realtime.start")]
    RealtimeStart,
    #[serde(rename = "realtime.stop")]
    RealtimeStop,
}

impl CommandName {
    pub const ALL: [Self; 29] = [
        Self::HostPing,
        Self::HostVersion,
        Self::HostShutdown,
        Self::WindowList,
        Self::WindowOpen,
        Self::WindowClose,
        Self::WindowMinimize,
        Self::WindowFocus,
        Self::WindowUpdate,
        Self::WindowPointerDown,
        Self::WindowPointerMove,
        Self::WindowPointerUp,
        Self::FsGet,
        Self::FsCreateFolder,
        Self::FsCreateFile,
        Self::FsRename,
        Self::FsDelete,
        Self::FsSearch,
        Self::FsOpen,
        Self::TerminalExec,
        Self::SettingsGet,
        Self::SettingsSetTheme,
        Self::SettingsSetWallpaper,
        Self::SettingsSetAccent,
        Self::AssistantStatus,
        Self::AssistantActivate,
        Self::RealtimeStatus,
        Self::RealtimeStart,
        Self::RealtimeStop,
    ];

    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::HostVersion => "host.version",
            Self::HostShutdown => "host.shutdown",
            Self::WindowList => "window.list",
            Self::WindowOpen => "window.open",
            Self::WindowClose => "window.close",
            Self::WindowMinimize => "window.minimize",
            Self::WindowFocus => "window.focus",
            Self::WindowUpdate => "window.update",
            Self::WindowPointerDown => "window.pointer_down",
            Self::WindowPointerMove => "window.pointer_move",
            Self::WindowPointerUp => "window.pointer_up",
            Self::FsGet => "fs.get",
            Self::FsCreateFolder => "fs.create_folder",
            Self::FsCreateFile => "fs.create_file",
            Self::FsRename => "fs.rename",
            Self::FsDelete => "fs.delete",
            Self::FsSearch => "fs.search",
            Self::FsOpen => "fs.open",
            Self::TerminalExec => "terminal.exec",
            Self::SettingsGet => "settings.get",
            Self::SettingsSetTheme => "settings.set_theme",
            Self::SettingsSetWallpaper => "settings.set_wallpaper",
            Self::SettingsSetAccent => "settings.set_accent",
            Self::AssistantStatus => "assistant.status",
            Self::AssistantActivate => "assistant.activate",
            Self::RealtimeStatus => "realtime.status",
            Self::RealtimeStart => "realtime.start",
            Self::RealtimeStop => "realtime.stop",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw)
    }
}

/// A versioned response envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }

    /// Error response carrying the stable error code in the payload, so the
    /// UI can pick an inline message without parsing text.
    #[must_use]
    pub fn from_error(request_id: impl Into<String>, error: &DesktopError) -> Self {
        Self {
            payload: serde_json::json!({
                "code": error.code(),
                "user_facing": error.is_user_facing(),
            }),
            ..Self::error(request_id, error.to_string())
        }
    }
}

/// A versioned command envelope from frontend -> backend host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and required identifiers.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, EVENT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A versioned event envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build a v1 event envelope.
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: event_id.into(),
            event: event.into(),
            payload,
        }
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContractError {}
